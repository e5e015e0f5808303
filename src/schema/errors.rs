//! Schema construction errors

use thiserror::Error;

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Reasons a list of field names cannot form a schema
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema must name at least one field")]
    Empty,

    #[error("field name at position {0} is empty")]
    EmptyName(usize),

    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    #[error("invalid field name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
}
