//! Observable engine events
//!
//! Events are explicit and typed; each has a stable SCREAMING_SNAKE name that
//! appears as the `event` field of its log line.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration file loaded
    ConfigLoaded,
    /// Canonical map or trust table swapped in
    TablesReloaded,

    // Schema registry
    /// One namespace schema published
    SchemaLoaded,
    /// A directory or document finished loading
    SchemasLoaded,
    /// A namespace definition was rejected
    SchemaRejected,
    /// A namespace was removed
    SchemaUnloaded,

    // Validation
    PayloadValidated,
    PayloadRejected,
    /// A payload carried a field its namespace does not define
    UnschemadFieldSeen,

    // Merge and resolution
    ExtensionsMerged,
    ProvenanceAppended,
    ConflictResolved,
    /// Top-trust candidates disagree; handed to review
    ConflictEscalated,
    ReviewQueued,

    // Ingest
    IngestBegin,
    IngestComplete,
    /// CLI ready to read payloads from stdin
    Serving,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::TablesReloaded => "TABLES_RELOADED",

            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::SchemaUnloaded => "SCHEMA_UNLOADED",

            Event::PayloadValidated => "PAYLOAD_VALIDATED",
            Event::PayloadRejected => "PAYLOAD_REJECTED",
            Event::UnschemadFieldSeen => "UNSCHEMAD_FIELD_SEEN",

            Event::ExtensionsMerged => "EXTENSIONS_MERGED",
            Event::ProvenanceAppended => "PROVENANCE_APPENDED",
            Event::ConflictResolved => "CONFLICT_RESOLVED",
            Event::ConflictEscalated => "CONFLICT_ESCALATED",
            Event::ReviewQueued => "REVIEW_QUEUED",

            Event::IngestBegin => "INGEST_BEGIN",
            Event::IngestComplete => "INGEST_COMPLETE",
            Event::Serving => "EXTFIELD_SERVING",
        }
    }

    /// Default severity when logged through `log_event`
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaRejected
            | Event::PayloadRejected
            | Event::UnschemadFieldSeen
            | Event::ConflictEscalated => Severity::Warn,
            Event::ProvenanceAppended => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
