//! Schema subsystem for pipedb
//!
//! A schema is the ordered list of field names every row of a table
//! carries. The first field is the primary key. Schemas are fixed for the
//! lifetime of an open store and are written verbatim as the table header,
//! so names are restricted to what survives a header round-trip.

mod errors;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use types::Schema;
