//! Records for pipedb
//!
//! [`Fields`] is a plain bag of values a caller builds before handing it to
//! a store. [`Record`] is what a store hands back: a handle on one row,
//! addressed by primary key, whose every access goes through the owning
//! store's read and write protocol.

mod fields;
mod handle;

pub use fields::Fields;
pub use handle::Record;
