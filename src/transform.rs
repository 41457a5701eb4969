//! Call-site rewriting.
//!
//! Two phases per pass, in order: **collect** parses the unit and binds
//! every top-level declaration, then **rewrite** scans the recognized call
//! expressions and produces one [`Replacement`] per marker call. No state
//! outlives a pass and nothing is registered lazily during rewriting, so
//! declaration order relative to call order never changes the output.

use crate::ast::{Node, NodeArena, NodeIndex};
use crate::binder::{BindResult, bind_source_file};
use crate::classifier::{ResolvedShape, resolve_shape};
use crate::diagnostics::DiagnosticBag;
use crate::parser::parse_source;
use crate::span::Span;
use crate::walker::{Property, PropertyWalker};
use tracing::debug;

/// A span of the original text and what to splice in its place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    pub span: Span,
    pub text: String,
}

/// Read-only projection of one parsed and bound compilation unit.
pub struct TransformContext {
    pub arena: NodeArena,
    pub source_file: NodeIndex,
    pub bound: BindResult,
}

impl TransformContext {
    /// Collection phase: parse the unit and bind its declarations. Scan and
    /// parse diagnostics accumulate in `bag`; the caller decides whether
    /// they are fatal before rewriting.
    pub fn collect(
        source: &str,
        file_name: &str,
        marker_modules: &[String],
        bag: &mut DiagnosticBag,
    ) -> TransformContext {
        let parsed = parse_source(source, file_name, bag);
        let bound = bind_source_file(&parsed.arena, parsed.source_file, marker_modules);
        TransformContext {
            arena: parsed.arena,
            source_file: parsed.source_file,
            bound,
        }
    }

    /// Rewrite phase: one replacement per call that resolves to the marker
    /// sentinel. Non-matching calls produce nothing and pass through.
    pub fn rewrite(&self) -> Vec<Replacement> {
        let mut replacements = Vec::new();
        let statements = match self.arena.get(self.source_file) {
            Some(Node::SourceFile(sf)) => &sf.statements,
            _ => return replacements,
        };
        for &stmt in statements {
            let Some(Node::RawStatement(raw)) = self.arena.get(stmt) else {
                continue;
            };
            for &call in &raw.calls {
                if let Some(replacement) = self.rewrite_call(call) {
                    replacements.push(replacement);
                }
            }
        }
        debug!(count = replacements.len(), "marker calls rewritten");
        replacements
    }

    fn rewrite_call(&self, call: NodeIndex) -> Option<Replacement> {
        let Some(Node::CallExpression(expr)) = self.arena.get(call) else {
            return None;
        };
        let callee = self.arena.identifier_text(expr.name)?;
        let symbol = self.bound.table.lookup(callee)?;
        if !self.bound.is_marker(symbol) {
            return None;
        }
        let properties = match &expr.type_arguments {
            // No type-argument list written: empty array, no walk.
            None => Vec::new(),
            Some(args) => match args.first() {
                None => Vec::new(),
                Some(&arg) => self.enumerate_root(call, arg),
            },
        };
        Some(Replacement {
            span: expr.span,
            text: render_property_array(&properties),
        })
    }

    /// Enumerate the immediate properties of a call's root type argument
    /// and walk each. Named references go through the table so the root
    /// joins the cycle path; everything else uses the member list resolved
    /// at bind time (inline literals, unions, intersections). Unresolvable
    /// roots degrade to an empty sequence.
    fn enumerate_root(&self, call: NodeIndex, arg: NodeIndex) -> Vec<Property> {
        let mut walker = PropertyWalker::new(&self.arena, &self.bound);
        if let ResolvedShape::Reference { name, .. } = resolve_shape(&self.arena, arg) {
            return match self.bound.table.lookup(&name) {
                Some(root) => walker.walk_root(root),
                None => Vec::new(),
            };
        }
        match self.bound.call_root_members.get(&call) {
            Some(members) => walker.walk_members(members, ""),
            None => Vec::new(),
        }
    }
}

/// Serialize a property sequence as a literal array of object literals.
fn render_property_array(properties: &[Property]) -> String {
    let records: Vec<String> = properties
        .iter()
        .map(|p| serde_json::to_string(p).unwrap_or_else(|_| "null".to_string()))
        .collect();
    format!("[{}]", records.join(", "))
}
