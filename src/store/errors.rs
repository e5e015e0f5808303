//! Store error types
//!
//! Error codes:
//! - PIPEDB_HEADERS_MISSING: opened a nonexistent file without a schema
//! - PIPEDB_HEADERS_MISMATCH: on-disk header or a record's fields disagree with the schema
//! - PIPEDB_KEY_EXISTS: `add` with a primary key already present
//! - PIPEDB_KEY_NOT_FOUND: lookup or delete of an absent key
//! - PIPEDB_UNKNOWN_FIELD / PIPEDB_READ_ONLY_FIELD / PIPEDB_UNSUPPORTED: record contract violations
//! - PIPEDB_INVALID_SCHEMA: field names cannot form a schema
//! - PIPEDB_CORRUPTION: table text failed to decode
//! - PIPEDB_IO_ERROR: filesystem failure, passed through unmodified as the source
//! - PIPEDB_LOCK_TIMEOUT: an opt-in bounded lock wait elapsed
//! - PIPEDB_STORE_CLOSED: a record outlived its store
//! - PIPEDB_CONFIG_ERROR: configuration failed to load or validate

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::codec::CodecError;
use crate::lock::LockError;
use crate::schema::SchemaError;

/// Store error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    HeadersMissing,
    HeadersMismatch,
    KeyExists,
    KeyNotFound,
    UnknownField,
    ReadOnlyField,
    Unsupported,
    InvalidSchema,
    Corruption,
    Io,
    LockTimeout,
    StoreClosed,
    Config,
}

impl StoreErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::HeadersMissing => "PIPEDB_HEADERS_MISSING",
            StoreErrorCode::HeadersMismatch => "PIPEDB_HEADERS_MISMATCH",
            StoreErrorCode::KeyExists => "PIPEDB_KEY_EXISTS",
            StoreErrorCode::KeyNotFound => "PIPEDB_KEY_NOT_FOUND",
            StoreErrorCode::UnknownField => "PIPEDB_UNKNOWN_FIELD",
            StoreErrorCode::ReadOnlyField => "PIPEDB_READ_ONLY_FIELD",
            StoreErrorCode::Unsupported => "PIPEDB_UNSUPPORTED",
            StoreErrorCode::InvalidSchema => "PIPEDB_INVALID_SCHEMA",
            StoreErrorCode::Corruption => "PIPEDB_CORRUPTION",
            StoreErrorCode::Io => "PIPEDB_IO_ERROR",
            StoreErrorCode::LockTimeout => "PIPEDB_LOCK_TIMEOUT",
            StoreErrorCode::StoreClosed => "PIPEDB_STORE_CLOSED",
            StoreErrorCode::Config => "PIPEDB_CONFIG_ERROR",
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with code, message, optional context and optional cause
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    details: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// File does not exist and no schema was supplied to create it
    pub fn headers_missing(path: &Path) -> Self {
        Self::new(
            StoreErrorCode::HeadersMissing,
            "table file does not exist and no schema was supplied",
        )
        .with_details(format!("path: {}", path.display()))
    }

    /// On-disk header differs from the established schema
    pub fn header_mismatch(expected: &[String], found: &[String]) -> Self {
        Self::new(
            StoreErrorCode::HeadersMismatch,
            "table header does not match the store schema",
        )
        .with_details(format!(
            "expected: [{}], found: [{}]",
            expected.join(", "),
            found.join(", ")
        ))
    }

    /// A record's field set differs from the schema
    pub fn fields_mismatch(reason: impl Into<String>) -> Self {
        Self::new(
            StoreErrorCode::HeadersMismatch,
            "record fields do not match the store schema",
        )
        .with_details(reason)
    }

    /// Primary key already present
    pub fn key_exists(key: &Value) -> Self {
        Self::new(StoreErrorCode::KeyExists, "primary key already exists")
            .with_details(format!("key: {}", key))
    }

    /// Primary key absent
    pub fn key_not_found(key: &Value) -> Self {
        Self::new(StoreErrorCode::KeyNotFound, "primary key not found")
            .with_details(format!("key: {}", key))
    }

    /// Field is not part of the schema
    pub fn unknown_field(field: &str) -> Self {
        Self::new(StoreErrorCode::UnknownField, "field not in schema")
            .with_details(format!("field: {}", field))
    }

    /// Attempt to assign the primary key field
    pub fn read_only_field(field: &str) -> Self {
        Self::new(StoreErrorCode::ReadOnlyField, "primary key field is read-only")
            .with_details(format!("field: {}", field))
    }

    /// Operation never permitted on a record
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Unsupported, message)
    }

    /// Table text failed to decode
    pub fn corruption(path: &Path, source: CodecError) -> Self {
        Self::new(StoreErrorCode::Corruption, "table file failed to decode")
            .with_details(format!("path: {}", path.display()))
            .with_source(source)
    }

    /// Two rows in the file carry the same primary key
    pub fn duplicate_key(path: &Path, key: &Value) -> Self {
        Self::new(
            StoreErrorCode::Corruption,
            "table file contains a duplicate primary key",
        )
        .with_details(format!("path: {}, key: {}", path.display(), key))
    }

    /// Filesystem failure
    pub fn io(message: impl Into<String>, path: &Path, source: io::Error) -> Self {
        Self::new(StoreErrorCode::Io, message)
            .with_details(format!("path: {}", path.display()))
            .with_source(source)
    }

    /// The record's store has been dropped
    pub fn store_closed() -> Self {
        Self::new(StoreErrorCode::StoreClosed, "store handle has been dropped")
    }

    /// Configuration failed to load or validate
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Config, message)
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error context
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns the underlying I/O error, if this is a filesystem failure
    pub fn io_source(&self) -> Option<&io::Error> {
        self.source.as_deref()?.downcast_ref::<io::Error>()
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<SchemaError> for StoreError {
    fn from(e: SchemaError) -> Self {
        Self::new(StoreErrorCode::InvalidSchema, "invalid schema").with_source(e)
    }
}

impl From<LockError> for StoreError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Timeout { .. } => {
                Self::new(StoreErrorCode::LockTimeout, "timed out waiting for lock").with_source(e)
            }
            LockError::Io { path, source } => {
                Self::io("failed to create lock marker", &path, source)
            }
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(StoreErrorCode::HeadersMissing.code(), "PIPEDB_HEADERS_MISSING");
        assert_eq!(StoreErrorCode::HeadersMismatch.code(), "PIPEDB_HEADERS_MISMATCH");
        assert_eq!(StoreErrorCode::KeyExists.code(), "PIPEDB_KEY_EXISTS");
        assert_eq!(StoreErrorCode::ReadOnlyField.code(), "PIPEDB_READ_ONLY_FIELD");
        assert_eq!(StoreErrorCode::Corruption.code(), "PIPEDB_CORRUPTION");
    }

    #[test]
    fn test_display_contains_code_and_details() {
        let err = StoreError::key_exists(&json!("1"));
        let display = err.to_string();
        assert!(display.contains("PIPEDB_KEY_EXISTS"));
        assert!(display.contains(r#"key: "1""#));
    }

    #[test]
    fn test_io_source_passes_through() {
        let err = StoreError::io(
            "failed to read table",
            Path::new("/tmp/t.db"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.code(), StoreErrorCode::Io);
        assert_eq!(
            err.io_source().map(io::Error::kind),
            Some(io::ErrorKind::PermissionDenied)
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_lock_errors_map_to_codes() {
        let timeout = StoreError::from(LockError::Timeout {
            path: PathBuf::from("/tmp/t.db.lock"),
            waited: std::time::Duration::from_millis(5),
        });
        assert_eq!(timeout.code(), StoreErrorCode::LockTimeout);

        let io_err = StoreError::from(LockError::Io {
            path: PathBuf::from("/tmp/t.db.lock"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        });
        assert_eq!(io_err.code(), StoreErrorCode::Io);
        assert!(io_err.io_source().is_some());
    }

    #[test]
    fn test_schema_error_maps_to_invalid_schema() {
        let err = StoreError::from(SchemaError::Empty);
        assert_eq!(err.code(), StoreErrorCode::InvalidSchema);
    }
}
