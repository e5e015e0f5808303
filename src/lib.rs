//! pipedb - A human-readable, single-file record store
//!
//! Records with a fixed schema live in one delimited text table that a
//! person can read and hand-edit. Any number of handles, across threads or
//! processes, can share the file: a sibling marker file serializes access
//! and each handle reloads its cache only when the file's mtime advances.
//!
//! ```no_run
//! use pipedb::{Fields, Schema, Store};
//!
//! # fn main() -> pipedb::StoreResult<()> {
//! let schema = Schema::new(["id", "name", "active"])?;
//! let store = Store::open("t.db", Some(schema))?;
//!
//! let alice = store.add(Fields::positional(["1"]).with("name", "alice").with("active", true))?;
//! alice.set("active", false)?;
//! store.delete("1")?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod lock;
pub mod observability;
pub mod record;
pub mod schema;
pub mod store;

pub use lock::LockConfig;
pub use record::{Fields, Record};
pub use schema::Schema;
pub use store::{Store, StoreConfig, StoreError, StoreErrorCode, StoreResult};
