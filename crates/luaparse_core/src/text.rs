//! Text range and position types for source location tracking.
//!
//! Tokens, AST nodes, and diagnostics all carry both a byte range (for fast
//! offset lookups) and 1-based line/column positions (for display).

use serde::Serialize;
use std::fmt;
use std::ops::Range;

/// A position in source text, measured as a byte offset from the start.
pub type TextPos = u32;

/// Number of columns a tab character advances the column counter by.
///
/// Tabs are counted as a fixed width rather than advancing to a tab stop.
pub const TAB_WIDTH: u32 = 2;

/// A half-open byte range `[start, end)` in source text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    /// The byte offset where this range starts (inclusive).
    #[serde(rename = "rangeStart")]
    pub start: TextPos,
    /// The byte offset where this range ends (exclusive).
    #[serde(rename = "rangeEnd")]
    pub end: TextPos,
}

impl TextRange {
    /// Create a new text range.
    #[inline]
    pub fn new(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    /// Create an empty range at a position.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self { start: pos, end: pos }
    }

    /// The length of this range in bytes.
    #[inline]
    pub fn len(&self) -> TextPos {
        self.end - self.start
    }

    /// Whether this range is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Convert to a byte range.
    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Whether this range contains a position.
    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Whether this range contains or touches the given position.
    #[inline]
    pub fn contains_inclusive(&self, pos: TextPos) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// Whether `other` lies entirely within this range.
    #[inline]
    pub fn encloses(&self, other: &TextRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Return a new range covering both this range and the other.
    pub fn union(&self, other: &TextRange) -> TextRange {
        TextRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Debug for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A 1-based line and column pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The finished source location of a token or node.
///
/// Unfinished locations never leave the parser: nodes under construction are
/// tracked with markers, and a `Location` only exists once both ends are known.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
    #[serde(flatten)]
    pub range: TextRange,
}

impl Location {
    pub fn new(start: Position, end: Position, range: TextRange) -> Self {
        Self { start, end, range }
    }

    /// A zero-width location at a single point.
    pub fn point(pos: Position, offset: TextPos) -> Self {
        Self {
            start: pos,
            end: pos,
            range: TextRange::empty(offset),
        }
    }

    /// A location spanning from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Location) -> Location {
        Location {
            start: self.start,
            end: other.end,
            range: TextRange::new(self.range.start, other.range.end.max(self.range.start)),
        }
    }
}

/// Compute the 1-based column of `pos` on the line that starts at `line_start`.
///
/// Line terminators contribute nothing, a tab contributes [`TAB_WIDTH`], and
/// every other character contributes one column. UTF-8 continuation bytes are
/// skipped so multi-byte characters count once.
pub fn column_at(text: &[u8], line_start: usize, pos: usize) -> u32 {
    let end = pos.min(text.len());
    let start = line_start.min(end);
    let mut column = 1u32;
    for &byte in &text[start..end] {
        column += match byte {
            b'\n' | b'\r' => 0,
            b'\t' => TAB_WIDTH,
            0x80..=0xBF => 0,
            _ => 1,
        };
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_range() {
        let range = TextRange::new(5, 15);
        assert_eq!(range.len(), 10);
        assert!(range.contains(5));
        assert!(range.contains(14));
        assert!(!range.contains(15));
        assert!(range.contains_inclusive(15));
    }

    #[test]
    fn test_text_range_encloses() {
        let outer = TextRange::new(0, 20);
        assert!(outer.encloses(&TextRange::new(3, 20)));
        assert!(!outer.encloses(&TextRange::new(3, 21)));
        assert_eq!(TextRange::new(2, 4).union(&TextRange::new(8, 9)), TextRange::new(2, 9));
    }

    #[test]
    fn test_column_at_counts_tabs_as_two() {
        let text = b"\tx = 1";
        assert_eq!(column_at(text, 0, 0), 1);
        assert_eq!(column_at(text, 0, 1), 3);
        assert_eq!(column_at(text, 0, 2), 4);
    }

    #[test]
    fn test_column_at_respects_line_start() {
        let text = b"a\nbc";
        assert_eq!(column_at(text, 2, 2), 1);
        assert_eq!(column_at(text, 2, 4), 3);
    }

    #[test]
    fn test_column_at_counts_multibyte_once() {
        let text = "é = 1".as_bytes();
        assert_eq!(column_at(text, 0, 2), 2);
    }

    #[test]
    fn test_location_to() {
        let a = Location::new(Position::new(1, 1), Position::new(1, 4), TextRange::new(0, 3));
        let b = Location::new(Position::new(2, 1), Position::new(2, 6), TextRange::new(4, 9));
        let joined = a.to(&b);
        assert_eq!(joined.range, TextRange::new(0, 9));
        assert_eq!(joined.end, Position::new(2, 6));
    }
}
