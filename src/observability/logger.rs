//! Structured JSON logger for pipedb
//!
//! - One log line = one event
//! - `event` first, `severity` second, then `ts`, then fields sorted by key
//! - Synchronous, one write per line, stderr only
//!
//! Output is gated by a process-wide minimum severity. It defaults to WARN
//! and can be set with [`Logger::set_min_severity`] or the `PIPEDB_LOG`
//! environment variable (`trace`, `info`, `warn`, `error`).

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Environment variable read once to initialize the severity threshold.
pub const LOG_ENV_VAR: &str = "PIPEDB_LOG";

const THRESHOLD_UNSET: u8 = u8::MAX;

static MIN_SEVERITY: AtomicU8 = AtomicU8::new(THRESHOLD_UNSET);

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-call detail (cache checks, lock hand-offs)
    Trace = 0,
    /// Normal lifecycle operations
    Info = 1,
    /// Recoverable or suspicious conditions
    Warn = 2,
    /// Operation failures
    Error = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }

    /// Parses a case-insensitive level name as accepted by `PIPEDB_LOG`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Severity::Trace),
            "info" => Some(Severity::Info),
            "warn" | "warning" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Severity::Trace,
            1 => Severity::Info,
            2 => Severity::Warn,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs JSON logs
pub struct Logger;

impl Logger {
    /// Sets the process-wide minimum severity.
    pub fn set_min_severity(severity: Severity) {
        MIN_SEVERITY.store(severity as u8, Ordering::Relaxed);
    }

    /// Returns the process-wide minimum severity, reading `PIPEDB_LOG`
    /// on first use.
    pub fn min_severity() -> Severity {
        let current = MIN_SEVERITY.load(Ordering::Relaxed);
        if current != THRESHOLD_UNSET {
            return Severity::from_u8(current);
        }

        let initial = std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|v| Severity::parse(&v))
            .unwrap_or(Severity::Warn);
        // Lose the race gracefully if another thread set it first
        let _ = MIN_SEVERITY.compare_exchange(
            THRESHOLD_UNSET,
            initial as u8,
            Ordering::Relaxed,
            Ordering::Relaxed,
        );
        Severity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Returns whether a line at `severity` would be emitted.
    pub fn enabled(severity: Severity) -> bool {
        severity >= Self::min_severity()
    }

    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        if !Self::enabled(severity) {
            return;
        }
        Self::log_to_writer(severity, event, fields, &mut io::stderr());
    }

    fn log_to_writer<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, &str)],
        writer: &mut W,
    ) {
        let line = Self::render(severity, event, fields);
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }

    /// One JSON object per line. Keys are written by hand so their order is
    /// fixed; every string goes through `serde_json` for escaping.
    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut pairs: Vec<(&str, &str)> = vec![
            ("event", event),
            ("severity", severity.as_str()),
            ("ts", ts.as_str()),
        ];

        let mut extra = fields.to_vec();
        extra.sort_by_key(|(key, _)| *key);
        pairs.extend(extra);

        let body: Vec<String> = pairs
            .into_iter()
            .map(|(key, value)| format!("{}:{}", quoted(key), quoted(value)))
            .collect();
        format!("{{{}}}\n", body.join(","))
    }
}

fn quoted(s: &str) -> String {
    Value::from(s).to_string()
}

#[cfg(test)]
fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    let mut buffer = Vec::new();
    Logger::log_to_writer(severity, event, fields, &mut buffer);
    String::from_utf8(buffer).unwrap()
}
