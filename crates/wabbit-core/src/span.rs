//! Source location tracking for error reporting.
//!
//! Provides [`Span`] so the checker can attach a position to each error it
//! records. The program tree is handed to the compiler by an external parser,
//! and trees built by hand (tests, tooling) may carry no positions at all, so
//! a default span means "position unknown".

use std::fmt;

/// A span of source code, represented by its starting position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed, 0 when unknown).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span points at a real source position.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line != 0
    }

    /// `Some(self)` for a known position, `None` otherwise.
    #[inline]
    pub fn known(self) -> Option<Span> {
        self.is_known().then_some(self)
    }

    /// Merge two spans into one that starts at the first span and extends to cover both.
    ///
    /// An unknown span contributes nothing to the result.
    pub fn merge(self, other: Span) -> Span {
        if !other.is_known() {
            return self;
        }
        if !self.is_known() {
            return other;
        }
        if self.line == other.line {
            let start_col = self.col.min(other.col);
            let end_col = (other.col + other.len).max(self.col + self.len);
            Span {
                line: self.line,
                col: start_col,
                len: end_col - start_col,
            }
        } else {
            // Multi-line spans keep the first position and approximate the length.
            Span {
                line: self.line,
                col: self.col,
                len: self.len + other.len,
            }
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.line, self.col)
        } else {
            f.write_str("<unknown>")
        }
    }
}
