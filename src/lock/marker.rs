//! Marker-file lock with reentrant hold count

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{LockError, LockResult};
use crate::observability::{log_event, Event, StoreMetrics};

/// Lock tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Backoff between exclusive-create attempts
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Break a marker whose mtime is at least this old. Off by default.
    #[serde(default)]
    pub stale_after_ms: Option<u64>,

    /// Give up after waiting this long. Off by default (wait forever).
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            stale_after_ms: None,
            timeout_ms: None,
        }
    }
}

impl LockConfig {
    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Returns the marker path guarding `path`: the same path with `.lock`
/// appended to the file name.
pub fn marker_path_for(path: &Path) -> PathBuf {
    let mut marker: OsString = path.as_os_str().to_owned();
    marker.push(".lock");
    PathBuf::from(marker)
}

/// Cooperative cross-process lock over a marker file.
///
/// Reentrant for one logical owner: nested [`acquire`](Self::acquire)
/// calls bump a hold count and only the outermost release deletes the
/// marker. The hold count is not a thread-level owner check, so callers
/// sharing one `FileLock` between threads must serialize access around
/// it; `Store` does so with its state mutex.
///
/// The marker holds this lock's owner token and the process id. Release
/// only deletes a marker carrying our token, so a marker re-created by
/// someone else after a stale break is left alone.
#[derive(Debug)]
pub struct FileLock {
    marker_path: PathBuf,
    config: LockConfig,
    token: String,
    holds: AtomicUsize,
    metrics: Arc<StoreMetrics>,
}

impl FileLock {
    /// Creates an unheld lock guarding `path`.
    pub fn new(path: &Path, config: LockConfig) -> Self {
        Self::with_metrics(path, config, Arc::new(StoreMetrics::new()))
    }

    /// Creates an unheld lock that reports to the given counters.
    pub fn with_metrics(path: &Path, config: LockConfig, metrics: Arc<StoreMetrics>) -> Self {
        Self {
            marker_path: marker_path_for(path),
            config,
            token: Uuid::new_v4().to_string(),
            holds: AtomicUsize::new(0),
            metrics,
        }
    }

    /// Path of the marker file
    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Current reentrant hold count; zero when unheld
    pub fn hold_count(&self) -> usize {
        self.holds.load(Ordering::Acquire)
    }

    /// Whether this lock currently holds the marker
    pub fn is_held(&self) -> bool {
        self.hold_count() > 0
    }

    /// Blocks until the marker is held, then returns a guard that releases
    /// it when dropped.
    ///
    /// # Errors
    ///
    /// `LockError::Io` if the marker cannot be created for a reason other
    /// than contention; `LockError::Timeout` only when `timeout_ms` is set.
    pub fn acquire(&self) -> LockResult<FileLockGuard<'_>> {
        if self.reenter() {
            return Ok(FileLockGuard { lock: self });
        }

        let started = Instant::now();
        let timeout = self.config.timeout_ms.map(Duration::from_millis);
        let mut contended = false;

        while !self.try_create()? {
            if self.break_if_stale()? {
                continue;
            }

            let waited = started.elapsed();
            if let Some(limit) = timeout {
                if waited >= limit {
                    let path = self.marker_path.display().to_string();
                    let waited_ms = waited.as_millis().to_string();
                    log_event(
                        Event::LockTimeout,
                        &[("path", path.as_str()), ("waited_ms", waited_ms.as_str())],
                    );
                    return Err(LockError::Timeout {
                        path: self.marker_path.clone(),
                        waited,
                    });
                }
            }

            if !contended {
                contended = true;
                let path = self.marker_path.display().to_string();
                log_event(Event::LockContended, &[("path", path.as_str())]);
            }
            self.metrics.increment_lock_contentions();
            thread::sleep(self.config.poll_interval());
        }

        self.holds.store(1, Ordering::Release);
        self.metrics.increment_lock_acquisitions();
        Ok(FileLockGuard { lock: self })
    }

    /// Makes a single acquisition attempt without waiting.
    ///
    /// Returns `Ok(None)` if another holder owns the marker.
    pub fn try_acquire(&self) -> LockResult<Option<FileLockGuard<'_>>> {
        if self.reenter() {
            return Ok(Some(FileLockGuard { lock: self }));
        }

        if self.try_create()? {
            self.holds.store(1, Ordering::Release);
            self.metrics.increment_lock_acquisitions();
            Ok(Some(FileLockGuard { lock: self }))
        } else {
            Ok(None)
        }
    }

    /// Drops one hold; the outermost release deletes the marker.
    ///
    /// Only guards call this, so every release pairs with one acquire.
    /// Releasing an unheld lock is a no-op. A marker that already vanished
    /// is tolerated silently.
    fn release(&self) {
        match self.holds.load(Ordering::Acquire) {
            0 => {}
            1 => {
                self.remove_own_marker();
                self.holds.store(0, Ordering::Release);
            }
            _ => {
                self.holds.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }

    fn reenter(&self) -> bool {
        if self.holds.load(Ordering::Acquire) > 0 {
            self.holds.fetch_add(1, Ordering::AcqRel);
            true
        } else {
            false
        }
    }

    /// One exclusive-create attempt. `Ok(false)` means contention.
    fn try_create(&self) -> LockResult<bool> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.marker_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(self.io_error(e)),
        };

        let stamp = format!("{} {}\n", self.token, std::process::id());
        if let Err(e) = file.write_all(stamp.as_bytes()) {
            let _ = fs::remove_file(&self.marker_path);
            return Err(self.io_error(e));
        }

        Ok(true)
    }

    /// Removes the marker if stale breaking is enabled and it is old enough.
    fn break_if_stale(&self) -> LockResult<bool> {
        let Some(stale_after) = self.config.stale_after_ms.map(Duration::from_millis) else {
            return Ok(false);
        };

        let modified = match fs::metadata(&self.marker_path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            // Released between our create attempt and now; just retry
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(self.io_error(e)),
        };

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();
        if age < stale_after {
            return Ok(false);
        }

        match fs::remove_file(&self.marker_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }

        let path = self.marker_path.display().to_string();
        let age_ms = age.as_millis().to_string();
        log_event(
            Event::LockStaleBreak,
            &[("path", path.as_str()), ("age_ms", age_ms.as_str())],
        );
        Ok(true)
    }

    fn remove_own_marker(&self) {
        match fs::read_to_string(&self.marker_path) {
            Ok(contents) if contents.split_whitespace().next() == Some(self.token.as_str()) => {}
            // Gone or someone else's; nothing of ours to remove
            Ok(_) => return,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                self.report_release_failure(&e);
                return;
            }
        }

        match fs::remove_file(&self.marker_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.report_release_failure(&e),
        }
    }

    fn report_release_failure(&self, e: &io::Error) {
        let path = self.marker_path.display().to_string();
        let reason = e.to_string();
        log_event(
            Event::LockReleaseFailed,
            &[("path", path.as_str()), ("reason", reason.as_str())],
        );
    }

    fn io_error(&self, source: io::Error) -> LockError {
        LockError::Io {
            path: self.marker_path.clone(),
            source,
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if self.is_held() {
            self.holds.store(1, Ordering::Release);
            self.release();
        }
    }
}

/// Scoped hold on a [`FileLock`]; dropping it releases one hold.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct FileLockGuard<'a> {
    lock: &'a FileLock,
}

impl FileLockGuard<'_> {
    /// Releases this hold now instead of at the end of scope
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for FileLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
