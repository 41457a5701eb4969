//! Recursive property enumeration.
//!
//! Given a record type's member symbols, the walker produces the flat,
//! declaration-ordered list of [`Property`] records that the rewriter
//! serializes into the call site. Nested record members are flattened with
//! dotted paths (`"bar.a"`); array element records are nested under
//! `elementKeys` with paths relative to the element.
//!
//! The walk never fails. Unresolvable names, unrecognized syntax, and type
//! cycles all degrade to `"unknown"` tags, element-type fallbacks, or simply
//! not descending.

use crate::ast::{Node, NodeArena, NodeIndex};
use crate::binder::{BindResult, SymbolFlags, SymbolId};
use crate::classifier::{PropertyType, ResolvedShape, classify, resolve_shape};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::trace;

/// One emitted property record.
///
/// `element_keys` and `element_type` are mutually exclusive and only ever
/// set for array-like properties: `element_keys` when the element is a
/// record type whose members could be enumerated, `element_type` otherwise.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub modifiers: Vec<String>,
    pub optional: bool,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(rename = "elementKeys", skip_serializing_if = "Option::is_none")]
    pub element_keys: Option<Vec<Property>>,
    #[serde(rename = "elementType", skip_serializing_if = "Option::is_none")]
    pub element_type: Option<PropertyType>,
}

/// Stateful walk over one root type. The visited set tracks symbols on the
/// current descent path, so a type may appear many times across siblings
/// but only once along any one chain.
pub struct PropertyWalker<'a> {
    arena: &'a NodeArena,
    bound: &'a BindResult,
    visited: FxHashSet<SymbolId>,
}

impl<'a> PropertyWalker<'a> {
    pub fn new(arena: &'a NodeArena, bound: &'a BindResult) -> PropertyWalker<'a> {
        PropertyWalker {
            arena,
            bound,
            visited: FxHashSet::default(),
        }
    }

    /// Walk the members of a named root type. The root itself joins the
    /// descent path, so a directly self-referential record terminates after
    /// one level.
    pub fn walk_root(&mut self, root: SymbolId) -> Vec<Property> {
        self.visited.insert(root);
        let members = self.bound.members_of(root).to_vec();
        let properties = self.walk_members(&members, "");
        self.visited.remove(&root);
        properties
    }

    /// Walk a member list under a dotted path prefix (empty at the root and
    /// inside array elements).
    pub fn walk_members(&mut self, members: &[SymbolId], path: &str) -> Vec<Property> {
        let mut out = Vec::new();
        for &member in members {
            self.walk_member(member, path, &mut out);
        }
        out
    }

    fn walk_member(&mut self, member: SymbolId, path: &str, out: &mut Vec<Property>) {
        let symbol = self.bound.symbols.get(member);
        let name = join_path(path, &symbol.name);
        let modifiers = self.collect_modifiers(&symbol.declarations);
        let optional = self.any_optional(&symbol.declarations);

        if symbol.flags.contains(SymbolFlags::METHOD) {
            out.push(Property {
                name,
                modifiers,
                optional,
                property_type: PropertyType::tag("Function"),
                element_keys: None,
                element_type: None,
            });
            return;
        }

        let type_node = self.declared_type(symbol.value_declaration);
        let property_type = classify(self.arena, type_node);
        trace!(property = %name, ty = ?property_type, "walking property");

        match resolve_shape(self.arena, type_node) {
            ResolvedShape::ArrayOf(elem) => {
                let (element_keys, element_type) = self.element_parts(elem);
                out.push(Property {
                    name,
                    modifiers,
                    optional,
                    property_type,
                    element_keys,
                    element_type,
                });
            }
            ResolvedShape::Reference {
                type_arguments, ..
            } if !type_arguments.is_empty() => {
                // Generic container such as `Array<Baz>`: the tag keeps the
                // written name, the first argument supplies the element.
                let (element_keys, element_type) = self.element_parts(type_arguments[0]);
                out.push(Property {
                    name,
                    modifiers,
                    optional,
                    property_type,
                    element_keys,
                    element_type,
                });
            }
            ResolvedShape::InlineRecord(literal) => {
                out.push(Property {
                    name: name.clone(),
                    modifiers,
                    optional,
                    property_type,
                    element_keys: None,
                    element_type: None,
                });
                let members = self
                    .bound
                    .literal_members
                    .get(&literal)
                    .cloned()
                    .unwrap_or_default();
                for m in members {
                    self.walk_member(m, &name, out);
                }
            }
            ResolvedShape::Reference {
                name: referenced, ..
            } => {
                out.push(Property {
                    name: name.clone(),
                    modifiers,
                    optional,
                    property_type,
                    element_keys: None,
                    element_type: None,
                });
                let Some(id) = self.bound.table.lookup(&referenced) else {
                    return;
                };
                if !self.visited.insert(id) {
                    return; // cycle: the record stands, the chain stops
                }
                let members = self.bound.members_of(id).to_vec();
                for m in members {
                    self.walk_member(m, &name, out);
                }
                self.visited.remove(&id);
            }
            ResolvedShape::Primitive
            | ResolvedShape::FunctionLike
            | ResolvedShape::Group(_)
            | ResolvedShape::Unrecognized => {
                out.push(Property {
                    name,
                    modifiers,
                    optional,
                    property_type,
                    element_keys: None,
                    element_type: None,
                });
            }
        }
    }

    /// `elementKeys` when the element type resolves to an enumerable record,
    /// `elementType` otherwise. Exactly one of the pair is `Some`.
    fn element_parts(
        &mut self,
        elem: NodeIndex,
    ) -> (Option<Vec<Property>>, Option<PropertyType>) {
        match resolve_shape(self.arena, elem) {
            ResolvedShape::InlineRecord(literal) => {
                let members = self
                    .bound
                    .literal_members
                    .get(&literal)
                    .cloned()
                    .unwrap_or_default();
                (Some(self.walk_members(&members, "")), None)
            }
            ResolvedShape::Reference {
                name,
                type_arguments,
            } => {
                // A generic element resolves through its argument before the
                // container name is tried against the table.
                if let Some(&arg) = type_arguments.first() {
                    return self.element_parts(arg);
                }
                if let Some(id) = self.bound.table.lookup(&name) {
                    let members = self.bound.members_of(id).to_vec();
                    if !members.is_empty() && self.visited.insert(id) {
                        let keys = self.walk_members(&members, "");
                        self.visited.remove(&id);
                        return (Some(keys), None);
                    }
                }
                (None, Some(classify(self.arena, elem)))
            }
            _ => (None, Some(classify(self.arena, elem))),
        }
    }

    fn declared_type(&self, declaration: NodeIndex) -> NodeIndex {
        match self.arena.get(declaration) {
            Some(Node::PropertySignature(prop)) => prop.type_node,
            _ => NodeIndex::NONE,
        }
    }

    /// Modifier names across all declarations of a symbol, deduplicated in
    /// first-seen order. Only `readonly` is named; any other modifier the
    /// parser consumed reports as `"unknown"`.
    fn collect_modifiers(&self, declarations: &[NodeIndex]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for &decl in declarations {
            if let Some(Node::PropertySignature(prop)) = self.arena.get(decl) {
                let flags = prop.modifiers;
                if flags.contains(crate::ast::ModifierFlags::READONLY)
                    && !out.iter().any(|m| m == "readonly")
                {
                    out.push("readonly".to_string());
                }
                if flags.contains(crate::ast::ModifierFlags::UNKNOWN)
                    && !out.iter().any(|m| m == "unknown")
                {
                    out.push("unknown".to_string());
                }
            }
        }
        out
    }

    /// A property is optional when any of its declarations marks it `?`.
    fn any_optional(&self, declarations: &[NodeIndex]) -> bool {
        declarations.iter().any(|&decl| match self.arena.get(decl) {
            Some(Node::PropertySignature(prop)) => prop.optional,
            Some(Node::MethodSignature(method)) => method.optional,
            _ => false,
        })
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_source_file;
    use crate::diagnostics::DiagnosticBag;
    use crate::parser::parse_source;

    fn walk(source: &str, root: &str) -> Vec<Property> {
        let mut bag = DiagnosticBag::new();
        let parsed = parse_source(source, "test.ts", &mut bag);
        assert!(!bag.has_errors(), "{bag:?}");
        let marker_modules = vec!["typed-data".to_string()];
        let bound = bind_source_file(&parsed.arena, parsed.source_file, &marker_modules);
        let id = bound.table.lookup(root).expect("root registered");
        PropertyWalker::new(&parsed.arena, &bound).walk_root(id)
    }

    fn names(properties: &[Property]) -> Vec<&str> {
        properties.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn nested_reference_flattens_with_dotted_paths() {
        let props = walk(
            "interface Bar { a: number; b: string }\n\
             interface Foo { a?: string; bar: Bar }",
            "Foo",
        );
        assert_eq!(names(&props), vec!["a", "bar", "bar.a", "bar.b"]);
        assert!(props[0].optional);
        assert!(!props[1].optional);
        assert_eq!(props[1].property_type, PropertyType::tag("Bar"));
        assert_eq!(props[2].property_type, PropertyType::tag("number"));
    }

    #[test]
    fn array_shorthand_of_record_nests_element_keys() {
        let props = walk(
            "interface Baz { x: number }\ninterface Foo { items: Baz[] }",
            "Foo",
        );
        assert_eq!(names(&props), vec!["items"]);
        assert_eq!(props[0].property_type, PropertyType::tag("array"));
        let keys = props[0].element_keys.as_ref().expect("element keys");
        // Element paths are relative to the element, not the property.
        assert_eq!(names(keys), vec!["x"]);
        assert!(props[0].element_type.is_none());
    }

    #[test]
    fn generic_array_keeps_written_tag() {
        let props = walk(
            "interface Baz { x: number }\ninterface Foo { items: Array<Baz> }",
            "Foo",
        );
        assert_eq!(props[0].property_type, PropertyType::tag("Array"));
        let keys = props[0].element_keys.as_ref().expect("element keys");
        assert_eq!(names(keys), vec!["x"]);
    }

    #[test]
    fn array_of_inline_literal_nests_element_keys() {
        let props = walk("interface Foo { items: { a: string; b: number }[] }", "Foo");
        let keys = props[0].element_keys.as_ref().expect("element keys");
        assert_eq!(names(keys), vec!["a", "b"]);
    }

    #[test]
    fn array_of_primitive_records_element_type() {
        let props = walk("interface Foo { tags: string[] }", "Foo");
        assert_eq!(props[0].property_type, PropertyType::tag("array"));
        assert!(props[0].element_keys.is_none());
        assert_eq!(
            props[0].element_type,
            Some(PropertyType::tag("string"))
        );
    }

    #[test]
    fn array_of_unresolved_name_falls_back_to_element_type() {
        let props = walk("interface Foo { items: Missing[] }", "Foo");
        assert!(props[0].element_keys.is_none());
        assert_eq!(
            props[0].element_type,
            Some(PropertyType::tag("Missing"))
        );
    }

    #[test]
    fn inline_literal_member_flattens_in_place() {
        let props = walk("interface Foo { nested: { a: number; b: string } }", "Foo");
        assert_eq!(names(&props), vec!["nested", "nested.a", "nested.b"]);
        assert_eq!(props[0].property_type, PropertyType::tag("object"));
    }

    #[test]
    fn readonly_modifier_is_reported() {
        let props = walk("interface Foo { readonly b: string; a: number }", "Foo");
        assert_eq!(props[0].modifiers, vec!["readonly".to_string()]);
        assert!(props[1].modifiers.is_empty());
    }

    #[test]
    fn unmodeled_modifier_reports_unknown() {
        let props = walk("interface Foo { public x: string }", "Foo");
        assert_eq!(props[0].name, "x");
        assert_eq!(props[0].modifiers, vec!["unknown".to_string()]);
    }

    #[test]
    fn method_is_function_without_descent() {
        let props = walk("interface Foo { fn(): void; x: number }", "Foo");
        assert_eq!(names(&props), vec!["fn", "x"]);
        assert_eq!(props[0].property_type, PropertyType::tag("Function"));
        assert!(props[0].element_keys.is_none());
    }

    #[test]
    fn union_member_is_tag_group_without_descent() {
        let props = walk(
            "interface Bar { x: number }\ninterface Foo { v: string | Bar }",
            "Foo",
        );
        assert_eq!(names(&props), vec!["v"]);
        assert_eq!(
            props[0].property_type,
            PropertyType::Group(vec![PropertyType::tag("string"), PropertyType::tag("Bar")])
        );
    }

    #[test]
    fn unresolved_reference_keeps_record_without_children() {
        let props = walk("interface Foo { m: Missing }", "Foo");
        assert_eq!(names(&props), vec!["m"]);
        assert_eq!(props[0].property_type, PropertyType::tag("Missing"));
    }

    #[test]
    fn direct_cycle_terminates_after_one_level() {
        let props = walk("interface A { next: A; v: number }", "A");
        assert_eq!(names(&props), vec!["next", "v"]);
    }

    #[test]
    fn mutual_cycle_terminates() {
        let props = walk(
            "interface A { b: B }\ninterface B { a: A; v: number }",
            "A",
        );
        assert_eq!(names(&props), vec!["b", "b.a", "b.v"]);
    }

    #[test]
    fn same_type_allowed_across_siblings() {
        let props = walk(
            "interface P { x: number }\ninterface Foo { one: P; two: P }",
            "Foo",
        );
        assert_eq!(names(&props), vec!["one", "one.x", "two", "two.x"]);
    }

    #[test]
    fn exported_interface_walks_through_export_target() {
        let props = walk(
            "export interface Bar { a: number }\ninterface Foo { bar: Bar }",
            "Foo",
        );
        assert_eq!(names(&props), vec!["bar", "bar.a"]);
    }

    #[test]
    fn property_serializes_with_renamed_fields() {
        let props = walk("interface Foo { tags: string[] }", "Foo");
        let json = serde_json::to_value(&props[0]).expect("serialize");
        assert_eq!(json["type"], "array");
        assert_eq!(json["elementType"], "string");
        assert_eq!(json["optional"], false);
        assert!(json.get("elementKeys").is_none());
    }
}
