//! Per-store operational counters
//!
//! - Counters only, monotonic
//! - Reset only when the store handle is created
//! - Relaxed atomics; exact values are not needed across threads mid-call

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters describing what a store handle has done since it was opened
#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Read-protocol invocations (mtime comparisons)
    freshness_checks: AtomicU64,
    /// Full table parses (mtime had advanced)
    table_parses: AtomicU64,
    /// Full table serializations written to disk
    table_writes: AtomicU64,
    /// Field assignments skipped because the value was unchanged
    skipped_writes: AtomicU64,
    /// Outermost lock acquisitions (reentrant nesting is not counted)
    lock_acquisitions: AtomicU64,
    /// Backoff sleeps taken while another holder owned the marker
    lock_contentions: AtomicU64,
}

impl StoreMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment_freshness_checks(&self) {
        self.freshness_checks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_table_parses(&self) {
        self.table_parses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_table_writes(&self) {
        self.table_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_skipped_writes(&self) {
        self.skipped_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_lock_acquisitions(&self) {
        self.lock_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn increment_lock_contentions(&self) {
        self.lock_contentions.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of full table parses so far
    pub fn table_parses(&self) -> u64 {
        self.table_parses.load(Ordering::Relaxed)
    }

    /// Number of table writes so far
    pub fn table_writes(&self) -> u64 {
        self.table_writes.load(Ordering::Relaxed)
    }

    /// Get all counters as a point-in-time snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            freshness_checks: self.freshness_checks.load(Ordering::Relaxed),
            table_parses: self.table_parses.load(Ordering::Relaxed),
            table_writes: self.table_writes.load(Ordering::Relaxed),
            skipped_writes: self.skipped_writes.load(Ordering::Relaxed),
            lock_acquisitions: self.lock_acquisitions.load(Ordering::Relaxed),
            lock_contentions: self.lock_contentions.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of a store's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub freshness_checks: u64,
    pub table_parses: u64,
    pub table_writes: u64,
    pub skipped_writes: u64,
    pub lock_acquisitions: u64,
    pub lock_contentions: u64,
}

impl MetricsSnapshot {
    /// Serialize the snapshot as a single-line JSON object
    pub fn to_json(&self) -> String {
        // Plain integer fields cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}
