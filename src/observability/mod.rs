//! Observability subsystem for pipedb
//!
//! - Structured logging (JSON, one line per event, stderr)
//! - Typed lifecycle events with fixed severities
//! - Per-store counters
//!
//! Observability is read-only: nothing here affects what a store does,
//! and a failed log write is dropped silently.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, LOG_ENV_VAR};
pub use metrics::{MetricsSnapshot, StoreMetrics};

/// Log a lifecycle event with fields at the event's own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Only verifies no panic; output is gated by the threshold
        log_event(Event::StoreOpen, &[("path", "/tmp/test.db")]);
        log_event(Event::ReadFailed, &[]);
    }
}
