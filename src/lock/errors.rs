//! Lock error types

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for lock operations
pub type LockResult<T> = Result<T, LockError>;

/// Lock acquisition failures
///
/// Contention alone is never an error; an acquirer only fails on an I/O
/// problem with the marker or when an opt-in wait bound elapses.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock marker {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("timed out after {}ms waiting for lock marker {}", waited.as_millis(), path.display())]
    Timeout { path: PathBuf, waited: Duration },
}
