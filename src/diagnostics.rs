//! Diagnostic infrastructure.
//!
//! Collects scan/parse errors with spans and severities. The driver turns a
//! non-empty error bag into a single [`CompileError`] that aggregates every
//! message, so callers see one combined report per failed compilation.

use crate::span::{Span, line_col};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning = 2,
    Error = 1,
}

impl DiagnosticSeverity {
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DiagnosticSeverity::Error)
    }
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A diagnostic message with location, severity, and code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file_name: String,
    pub span: Span,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub code: u32,
}

impl Diagnostic {
    /// Format as `file:line:col - severity TDnnnn: message`.
    pub fn format(&self, source: &str) -> String {
        let (line, col) = line_col(source, self.span.start);
        format!(
            "{}:{}:{} - {} TD{}: {}",
            self.file_name, line, col, self.severity, self.code, self.message
        )
    }
}

/// A collection of diagnostics for one compilation pass.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> DiagnosticBag {
        DiagnosticBag::default()
    }

    pub fn error(&mut self, file_name: &str, span: Span, message: impl Into<String>, code: u32) {
        self.diagnostics.push(Diagnostic {
            file_name: file_name.to_string(),
            span,
            message: message.into(),
            severity: DiagnosticSeverity::Error,
            code,
        });
    }

    pub fn warning(&mut self, file_name: &str, span: Span, message: impl Into<String>, code: u32) {
        self.diagnostics.push(Diagnostic {
            file_name: file_name.to_string(),
            span,
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
            code,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Fatal compilation failure: every collected diagnostic in one report.
#[derive(Clone, Debug)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
    rendered: String,
}

impl CompileError {
    pub fn new(bag: DiagnosticBag, source: &str) -> CompileError {
        let diagnostics = bag.into_vec();
        let rendered = diagnostics
            .iter()
            .map(|d| d.format(source))
            .collect::<Vec<_>>()
            .join("\n");
        CompileError {
            diagnostics,
            rendered,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rendered)
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bag_tracks_error_state() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());
        bag.warning("a.ts", Span::new(0, 1), "odd", 6000);
        assert!(!bag.has_errors());
        bag.error("a.ts", Span::new(0, 1), "bad", 1005);
        assert!(bag.has_errors());
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn format_includes_location_and_code() {
        let mut bag = DiagnosticBag::new();
        bag.error("foo.ts", Span::new(3, 4), "'{' expected.", 1005);
        let source = "ab\ncd";
        let msg = bag.iter().next().unwrap().format(source);
        assert_eq!(msg, "foo.ts:2:1 - error TD1005: '{' expected.");
    }

    #[test]
    fn compile_error_aggregates_all_messages() {
        let mut bag = DiagnosticBag::new();
        bag.error("x.ts", Span::new(0, 1), "first", 1005);
        bag.error("x.ts", Span::new(1, 2), "second", 1109);
        let err = CompileError::new(bag, "ab");
        let text = err.to_string();
        assert!(text.contains("first"));
        assert!(text.contains("second"));
        assert_eq!(text.lines().count(), 2);
    }
}
