//! Table file loading
//!
//! Parses the whole file into a fresh [`Table`] before anything is handed
//! back, so a failure at any line leaves the caller's cache untouched.

use std::fs;
use std::path::Path;

use super::errors::{StoreError, StoreResult};
use super::table::Table;
use crate::codec::decode_table;
use crate::schema::Schema;

/// Reads and decodes the table at `path`.
///
/// With `expected`, the header must list exactly those fields in that
/// order. Without it, the header becomes the schema.
///
/// # Errors
///
/// - `PIPEDB_IO_ERROR` if the file cannot be read
/// - `PIPEDB_CORRUPTION` if the text does not decode, or two rows share a
///   primary key
/// - `PIPEDB_HEADERS_MISMATCH` if the header differs from `expected`
/// - `PIPEDB_INVALID_SCHEMA` if the header cannot form a schema
pub(crate) fn load_table(path: &Path, expected: Option<&Schema>) -> StoreResult<(Schema, Table)> {
    let text = fs::read_to_string(path)
        .map_err(|e| StoreError::io("failed to read table", path, e))?;

    let decoded = decode_table(&text).map_err(|e| StoreError::corruption(path, e))?;

    let schema = match expected {
        Some(schema) if schema.fields() != decoded.header.as_slice() => {
            return Err(StoreError::header_mismatch(schema.fields(), &decoded.header));
        }
        Some(schema) => schema.clone(),
        None => Schema::new(decoded.header)?,
    };

    let mut table = Table::new();
    for row in decoded.rows {
        if table.contains(&row[0]) {
            return Err(StoreError::duplicate_key(path, &row[0]));
        }
        table.insert(row);
    }

    Ok((schema, table))
}
