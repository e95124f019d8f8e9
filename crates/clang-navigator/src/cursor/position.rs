use clang_ast::BareSourceLocation;
use serde::Serialize;

/// A 1-based line and byte column, the way Clang counts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub const fn new(
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            line,
            column,
        }
    }
}

/// A half-open source range: `end` is one past the last byte covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SourceExtent {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceExtent {
    pub const fn new(
        start: SourcePosition,
        end: SourcePosition,
    ) -> Self {
        Self {
            start,
            end,
        }
    }

    /// Convert a Clang range, whose end points at the start of the last token.
    pub(crate) fn from_token_range(
        begin: &BareSourceLocation,
        end: &BareSourceLocation,
    ) -> Self {
        let end_column = end.col + end.tok_len.max(1);
        Self::new(
            SourcePosition::new(begin.line as u32, begin.col as u32),
            SourcePosition::new(end.line as u32, end_column as u32),
        )
    }

    pub fn contains(
        &self,
        position: SourcePosition,
    ) -> bool {
        self.start <= position && position < self.end
    }

    /// Whether `self` is strictly more specific than `other`.
    pub fn is_narrower_than(
        &self,
        other: &Self,
    ) -> bool {
        self.start > other.start || (self.start == other.start && self.end < other.end)
    }
}
