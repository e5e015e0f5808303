//! Table store subsystem for pipedb
//!
//! A store owns one table file: a header of field names, a divider, and
//! one row per record. The in-memory cache is a copy of the file kept
//! current by two protocols.
//!
//! # Read protocol
//!
//! - Stat the file; if its mtime is not newer than the last one observed,
//!   serve the cache as is
//! - Otherwise, under the marker lock, parse the whole file and replace
//!   the cache and mtime together, or keep both on any failure
//!
//! # Write protocol
//!
//! - Under the marker lock, serialize the whole cache in row order
//! - Replace the file (temp file + rename by default) and record its new mtime
//!
//! Every mutating call holds the lock across read, mutation and write.
//!
//! # Limitations
//!
//! Two writes inside one filesystem timestamp tick are indistinguishable
//! to the read protocol: a handle that observed the first can miss the
//! second until the file changes again.

mod config;
mod errors;
mod handle;
mod reader;
mod shared;
mod table;
mod writer;

pub use config::StoreConfig;
pub use errors::{StoreError, StoreErrorCode, StoreResult};
pub use handle::Store;

pub(crate) use shared::Shared;
