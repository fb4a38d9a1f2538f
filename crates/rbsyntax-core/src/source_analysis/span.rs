// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Every token and AST node carries a `Span`. A span records both the byte
//! range into the normalized source text (for slicing and `miette` labels)
//! and the line/column of each end (for human-facing diagnostics).

use std::fmt;
use std::ops::Range;

/// A point in the source text.
///
/// `line` is 1-based (offset by the configured starting line), `column` is
/// the 0-based byte column within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Location {
    /// Byte offset into the normalized source text.
    pub offset: u32,
    /// 1-based line number.
    pub line: u32,
    /// 0-based byte column.
    pub column: u32,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span of source code.
///
/// # Examples
///
/// ```
/// use rbsyntax_core::source_analysis::{Location, Span};
///
/// let span = Span::new(Location::new(0, 1, 0), Location::new(10, 1, 10));
/// assert_eq!(span.start(), 0);
/// assert_eq!(span.end(), 10);
/// assert_eq!(span.len(), 10);
/// assert_eq!(span.start_location().line, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: Location,
    end: Location,
}

impl Span {
    /// Creates a new span between two locations.
    #[must_use]
    pub const fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Creates an empty span at a single location.
    #[must_use]
    pub const fn point(at: Location) -> Self {
        Self { start: at, end: at }
    }

    /// Returns the start byte offset.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start.offset
    }

    /// Returns the end byte offset (exclusive).
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end.offset
    }

    /// Returns the start location.
    #[must_use]
    pub const fn start_location(self) -> Location {
        self.start
    }

    /// Returns the end location.
    #[must_use]
    pub const fn end_location(self) -> Location {
        self.end
    }

    /// Returns the length of the span in bytes.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Returns true if the span is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.offset >= self.end.offset
    }

    /// Returns true if `other` is fully contained within `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }

    /// Creates a span that covers both `self` and `other`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Converts to a `Range<usize>` for indexing into source text.
    #[must_use]
    pub const fn as_range(self) -> Range<usize> {
        self.start.offset as usize..self.end.offset as usize
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.as_range()
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start() as usize, span.len() as usize).into()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32) -> Span {
        Span::new(Location::new(start, 1, start), Location::new(end, 1, end))
    }

    #[test]
    fn span_new_and_accessors() {
        let span = span(5, 15);
        assert_eq!(span.start(), 5);
        assert_eq!(span.end(), 15);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
    }

    #[test]
    fn span_point_is_empty() {
        let span = Span::point(Location::new(5, 2, 1));
        assert!(span.is_empty());
        assert_eq!(span.len(), 0);
        assert_eq!(span.start_location().line, 2);
    }

    #[test]
    fn span_merge_keeps_outer_locations() {
        let a = Span::new(Location::new(5, 1, 5), Location::new(10, 1, 10));
        let b = Span::new(Location::new(15, 2, 3), Location::new(20, 2, 8));
        let merged = b.merge(a);
        assert_eq!(merged.start(), 5);
        assert_eq!(merged.end(), 20);
        assert_eq!(merged.start_location().line, 1);
        assert_eq!(merged.end_location().line, 2);
        assert_eq!(merged.end_location().column, 8);
    }

    #[test]
    fn span_contains() {
        assert!(span(0, 10).contains(span(2, 5)));
        assert!(!span(2, 5).contains(span(0, 10)));
    }

    #[test]
    fn span_as_range_and_miette() {
        let span = span(5, 15);
        let range: Range<usize> = span.into();
        assert_eq!(range, 5..15);
        let source_span: miette::SourceSpan = span.into();
        assert_eq!(source_span.offset(), 5);
        assert_eq!(source_span.len(), 10);
    }

    #[test]
    fn location_display() {
        assert_eq!(Location::new(12, 3, 4).to_string(), "3:4");
    }
}
