//! Source spans.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Half-open offset range `[start, end)` into the original source text.
///
/// Offsets are UTF-8 byte offsets, so `&source[span.start..span.end]`
/// recovers the markup a node or attribute was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// First byte covered.
    pub start: usize,
    /// One past the last byte covered.
    pub end: usize,
}

impl Span {
    /// Build a span; `end` is clamped so it is never before `start`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        let end = if end < start { start } else { end };
        Self { start, end }
    }

    /// Number of bytes covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Whether `other` lies entirely within `self`.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two spans share at least one byte.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The covered slice of `source`, if the span is in range and on
    /// character boundaries.
    #[must_use]
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::Span;

    #[test]
    fn test_new_clamps_end() {
        assert_eq!(Span::new(5, 2), Span::new(5, 5));
        assert!(Span::new(5, 2).is_empty());
    }

    #[test]
    fn test_cover_and_overlap() {
        let a = Span::new(0, 4);
        let b = Span::new(3, 9);
        assert!(a.overlaps(&b));
        assert_eq!(a.cover(b), Span::new(0, 9));
        assert!(!Span::new(0, 3).overlaps(&Span::new(3, 6)));
    }

    #[test]
    fn test_slice_respects_char_boundaries() {
        let source = "a\u{e9}b";
        assert_eq!(Span::new(1, 3).slice(source), Some("\u{e9}"));
        assert_eq!(Span::new(1, 2).slice(source), None);
        assert_eq!(Span::new(0, 10).slice(source), None);
    }
}
