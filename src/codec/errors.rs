//! Codec error types

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Reasons table text cannot be decoded
///
/// Line numbers are 1-based and count the header and divider.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("table has no header line")]
    MissingHeader,

    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}, column {column}: invalid literal {token:?}: {source}")]
    InvalidLiteral {
        line: usize,
        column: usize,
        token: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CodecError {
    /// Line the error was detected on, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            CodecError::MissingHeader => None,
            CodecError::ColumnCount { line, .. } | CodecError::InvalidLiteral { line, .. } => {
                Some(*line)
            }
        }
    }
}
