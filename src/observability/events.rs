//! Observable events for pipedb
//!
//! Events are explicit and typed; each maps to a fixed severity so call
//! sites never pick a level ad hoc.

use std::fmt;

use super::logger::Severity;

/// Observable events in a store's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// An existing table file was opened
    StoreOpen,
    /// A new, empty table file was created
    StoreCreate,
    /// The cache was reloaded because the file's mtime advanced
    CacheRefresh,
    /// The cache was serialized to the file
    TableWrite,
    /// A field assignment matched the current value; no write issued
    RecordWriteSkipped,
    /// The lock marker already existed; the acquirer is backing off
    LockContended,
    /// A marker older than the configured staleness bound was removed
    LockStaleBreak,
    /// A bounded lock wait gave up
    LockTimeout,
    /// The marker could not be removed; other acquirers will block
    LockReleaseFailed,
    /// Parsing the table file failed; the previous cache was kept
    ReadFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreOpen => "STORE_OPEN",
            Event::StoreCreate => "STORE_CREATE",
            Event::CacheRefresh => "CACHE_REFRESH",
            Event::TableWrite => "TABLE_WRITE",
            Event::RecordWriteSkipped => "RECORD_WRITE_SKIPPED",
            Event::LockContended => "LOCK_CONTENDED",
            Event::LockStaleBreak => "LOCK_STALE_BREAK",
            Event::LockTimeout => "LOCK_TIMEOUT",
            Event::LockReleaseFailed => "LOCK_RELEASE_FAILED",
            Event::ReadFailed => "READ_FAILED",
        }
    }

    /// Severity at which this event is logged
    pub fn severity(&self) -> Severity {
        match self {
            Event::CacheRefresh
            | Event::TableWrite
            | Event::RecordWriteSkipped
            | Event::LockContended => Severity::Trace,
            Event::StoreOpen | Event::StoreCreate => Severity::Info,
            Event::LockStaleBreak => Severity::Warn,
            Event::LockTimeout | Event::LockReleaseFailed | Event::ReadFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 10] = [
        Event::StoreOpen,
        Event::StoreCreate,
        Event::CacheRefresh,
        Event::TableWrite,
        Event::RecordWriteSkipped,
        Event::LockContended,
        Event::LockStaleBreak,
        Event::LockTimeout,
        Event::LockReleaseFailed,
        Event::ReadFailed,
    ];

    #[test]
    fn test_all_events_have_string_representation() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_failures_log_at_error() {
        assert_eq!(Event::ReadFailed.severity(), Severity::Error);
        assert_eq!(Event::LockTimeout.severity(), Severity::Error);
        assert_eq!(Event::LockStaleBreak.severity(), Severity::Warn);
        assert_eq!(Event::CacheRefresh.severity(), Severity::Trace);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::TableWrite), "TABLE_WRITE");
    }
}
