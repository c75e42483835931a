//! Logging and counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on ingest outcomes
//! 3. No background threads
//! 4. Deterministic field order
//!
//! # Usage
//!
//! ```ignore
//! use extfield::observability::{Logger, Event, MetricsRegistry};
//!
//! Logger::info("INGEST_COMPLETE", &[("profile_id", "p-1")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_merges();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Logs an event at its default severity.
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Logs an event with fields at its default severity.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // no subscriber installed; must not panic
        log_event(Event::IngestBegin);
        log_event(Event::IngestComplete);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::ConfigLoaded, &[("schema_dir", "/tmp/schemas")]);
    }
}
