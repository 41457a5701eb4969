//! Output assembly.
//!
//! The emitter splices replacement texts into the original source by span.
//! Everything outside a replaced span is carried through byte for byte, so
//! statements the parser did not model survive untouched.

use crate::transform::Replacement;
use tracing::warn;

/// Apply span replacements to the source text.
///
/// Replacements are applied in span order. A replacement that overlaps one
/// already applied is dropped (a marker call nested inside another marker
/// call's argument list is already covered by the outer rewrite).
pub fn apply_replacements(source: &str, replacements: &[Replacement]) -> String {
    let mut ordered: Vec<&Replacement> = replacements.iter().collect();
    ordered.sort_by_key(|r| (r.span.start, r.span.end));

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for replacement in ordered {
        let start = replacement.span.start as usize;
        let end = replacement.span.end as usize;
        if start < cursor || end > source.len() || start > end {
            warn!(span = ?replacement.span, "skipping overlapping or out-of-range replacement");
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&replacement.text);
        cursor = end;
    }
    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn rep(start: u32, end: u32, text: &str) -> Replacement {
        Replacement {
            span: Span::new(start, end),
            text: text.to_string(),
        }
    }

    #[test]
    fn splices_in_span_order() {
        let source = "aa XX bb YY cc";
        let reps = vec![rep(9, 11, "2"), rep(3, 5, "1")];
        assert_eq!(apply_replacements(source, &reps), "aa 1 bb 2 cc");
    }

    #[test]
    fn no_replacements_returns_source_verbatim() {
        let source = "const x = 1;\n";
        assert_eq!(apply_replacements(source, &[]), source);
    }

    #[test]
    fn overlapping_replacement_is_dropped() {
        let source = "abcdef";
        let reps = vec![rep(0, 4, "OUTER"), rep(2, 3, "inner")];
        assert_eq!(apply_replacements(source, &reps), "OUTERef");
    }

    #[test]
    fn out_of_range_replacement_is_dropped() {
        let source = "abc";
        let reps = vec![rep(10, 12, "nope")];
        assert_eq!(apply_replacements(source, &reps), "abc");
    }
}
