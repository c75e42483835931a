//! Structured logger
//!
//! - One log line = one event
//! - Explicit severity levels
//! - Fields rendered with deterministic (sorted) key order
//!
//! Lines are emitted through `tracing`; whatever subscriber the binary
//! installs decides where they go. Without a subscriber logging is a no-op.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Debug-level detail
    Trace = 0,
    /// Normal operations
    Info = 1,
    /// Recoverable issues
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub struct Logger;

impl Logger {
    /// Logs an event with the given severity and fields.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let rendered = Self::render_fields(fields);
        let severity_name = severity.as_str();
        match severity {
            Severity::Trace => {
                tracing::trace!(target: "extfield", event = event, severity = severity_name, fields = %rendered)
            }
            Severity::Info => {
                tracing::info!(target: "extfield", event = event, severity = severity_name, fields = %rendered)
            }
            Severity::Warn => {
                tracing::warn!(target: "extfield", event = event, severity = severity_name, fields = %rendered)
            }
            Severity::Error | Severity::Fatal => {
                tracing::error!(target: "extfield", event = event, severity = severity_name, fields = %rendered)
            }
        }
    }

    /// Renders fields as a JSON object with keys in sorted order.
    ///
    /// A key given twice keeps its last value.
    pub fn render_fields(fields: &[(&str, &str)]) -> String {
        let sorted: BTreeMap<&str, &str> = fields.iter().copied().collect();
        serde_json::to_string(&sorted).unwrap_or_else(|_| String::from("{}"))
    }

    pub fn trace(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Trace, event, fields);
    }

    pub fn info(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    pub fn warn(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    pub fn error(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    pub fn fatal(event: &str, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}
