//! Byte-offset source spans.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into a source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Span {
        Span { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Slice the spanned text out of `source`.
    ///
    /// Returns an empty string when the span is out of bounds rather than
    /// panicking; spans always come from the scanner, so out-of-bounds here
    /// means a caller bug, not bad input.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or("")
    }

    /// Smallest span covering both `self` and `other`.
    pub fn union(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Resolve a byte offset to a 1-based (line, column) pair.
pub fn line_col(source: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(source.len());
    let mut line = 1u32;
    let mut col = 1u32;
    for ch in source[..offset].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_text_slices_source() {
        let src = "interface Foo {}";
        assert_eq!(Span::new(10, 13).text(src), "Foo");
    }

    #[test]
    fn span_text_out_of_bounds_is_empty() {
        assert_eq!(Span::new(5, 99).text("abc"), "");
    }

    #[test]
    fn line_col_counts_newlines() {
        let src = "a\nbc\nd";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 2), (2, 1));
        assert_eq!(line_col(src, 5), (3, 1));
    }

    #[test]
    fn union_covers_both() {
        let joined = Span::new(4, 8).union(Span::new(2, 6));
        assert_eq!(joined, Span::new(2, 8));
    }
}
