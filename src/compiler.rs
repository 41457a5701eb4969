//! Driver for one transform pass.
//!
//! A pass parses a unit, binds its declarations, rewrites marker calls, and
//! splices the results back into the text. All state is local to the pass;
//! compiling two files never shares a symbol table, so output depends only
//! on the unit's own text and the options.

use crate::diagnostics::{CompileError, DiagnosticBag};
use crate::emitter::apply_replacements;
use crate::transform::TransformContext;
use anyhow::Context as _;
use std::fs;
use std::path::Path;
use tracing::info;

/// Per-pass configuration.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Module names whose `typedData` export counts as the marker. Matched
    /// against the final path segment of an import specifier.
    pub marker_modules: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> CompileOptions {
        CompileOptions {
            marker_modules: vec!["typed-data".to_string(), "define-typed-data".to_string()],
        }
    }
}

/// Transform one unit of source text.
///
/// Scan and parse errors in recognized declarations are fatal and surface
/// as one aggregated [`CompileError`]; ambiguity below that level degrades
/// inside the walk and never fails the pass.
pub fn compile_source(
    source: &str,
    file_name: &str,
    options: &CompileOptions,
) -> Result<String, CompileError> {
    let mut bag = DiagnosticBag::new();
    let ctx = TransformContext::collect(source, file_name, &options.marker_modules, &mut bag);
    if bag.has_errors() {
        return Err(CompileError::new(bag, source));
    }
    let replacements = ctx.rewrite();
    info!(
        file = file_name,
        replacements = replacements.len(),
        "transformed unit"
    );
    Ok(apply_replacements(source, &replacements))
}

/// Read a file and transform it.
pub fn compile_file(path: &Path, options: &CompileOptions) -> anyhow::Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path.to_string_lossy();
    compile_source(&source, &file_name, options)
        .map_err(|err| anyhow::Error::new(err).context(format!("failed to transform {}", path.display())))
}
