//! Table codec for pipedb
//!
//! Pure conversions between rows of JSON scalar values and the on-disk
//! table text. No I/O happens here.
//!
//! # Format
//!
//! ```text
//!  id  | name    | active
//! -----+---------+--------
//!  "1" | "alice" | true
//!  "2" | "b|ob"  | false
//! ```
//!
//! - Line 1: header, the schema's field names
//! - Line 2: divider, cosmetic, skipped on read whatever it contains
//! - Line 3+: one row per line, each column a JSON literal
//!
//! Columns are separated by `|`. A `|` inside a quoted literal is not a
//! separator, so splitting is a quote-aware scan rather than a plain split.
//! Whitespace around each column is insignificant; padding is purely for
//! people reading or hand-editing the file. A whitespace-only line ends
//! the table.

mod errors;
mod line;
mod table;

pub use errors::{CodecError, CodecResult};
pub use line::{decode_header, decode_row, encode_literal, split_fields, DELIMITER};
pub use table::{decode_table, encode_table, DecodedTable};
