//! Cross-process lock for pipedb
//!
//! Mutual exclusion is arbitrated by a sibling marker file
//! (`<table>.lock`) created with exclusive-create semantics. Whoever
//! creates it holds the lock; releasing deletes it. Waiters poll with a
//! fixed backoff.
//!
//! # Limitations
//!
//! - Not fair and, by default, not bounded: an acquirer waits forever.
//! - A process that dies while holding the lock leaves the marker behind
//!   and every other acquirer blocks until someone removes it by hand.
//!   [`LockConfig::stale_after_ms`] opts into breaking markers older than
//!   a bound. It is off by default.

mod errors;
mod marker;

pub use errors::{LockError, LockResult};
pub use marker::{marker_path_for, FileLock, FileLockGuard, LockConfig};
