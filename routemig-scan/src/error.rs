//! Error type for source files that cannot be scanned.

use thiserror::Error;

/// A source file could not be tokenized or parsed.
///
/// `offset` is a byte offset into the source; `line` and `column` are
/// 1-based and filled in once the failing source text is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    /// Create an error at the given byte offset.
    pub fn at(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            line: 0,
            column: 0,
            message: message.into(),
        }
    }

    /// Resolve `line` and `column` against the source the offset points into.
    pub fn locate(mut self, source: &str) -> Self {
        let before = source.get(..self.offset).unwrap_or(source);
        self.line = before.matches('\n').count() + 1;
        self.column = before.rsplit('\n').next().map_or(0, |line| line.chars().count()) + 1;
        self
    }

    /// Move `offset` forward by `bytes`, for sources with a stripped prefix.
    pub fn shifted(mut self, bytes: usize) -> Self {
        self.offset += bytes;
        self
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
