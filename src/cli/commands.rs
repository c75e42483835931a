//! CLI command implementations
//!
//! Every command loads the engine from its config before doing anything else.
//! `ingest` is a serving loop: one request per stdin line, one response per
//! stdout line, until EOF.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing_subscriber::EnvFilter;

use super::args::{Cli, Command};
use super::config::{Engine, EngineConfig};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_document, read_lines, write_error, write_error_with_details, write_response};
use crate::observability::{log_event_with_fields, Event};
use crate::profile::IngestError;

/// One line of `ingest` input
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestRequest {
    pub profile_id: String,
    pub namespace: String,
    pub payload: Value,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Installs the stderr JSON subscriber. Filter comes from `EXTFIELD_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("EXTFIELD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber already installed (tests, embedding) is left in place.
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { config } => check(&config),
        Command::Validate { config, namespace } => validate(&config, &namespace),
        Command::Ingest { config } => ingest(&config),
    }
}

fn load_engine(config_path: &Path) -> CliResult<Engine> {
    let config = EngineConfig::load(config_path)?;
    Engine::build(&config)
}

/// Loads every schema and table and reports what was accepted.
///
/// Fails after writing the report if any schema document was rejected.
pub fn check(config_path: &Path) -> CliResult<()> {
    let engine = load_engine(config_path)?;
    let assembler = &engine.assembler;
    let mapping = assembler.mapping();

    write_response(&json!({
        "schemas": &engine.schemas,
        "namespaces": assembler.registry().list_namespaces(),
        "canonical_fields": mapping.canonical_fields().collect::<Vec<_>>(),
    }))?;

    if !engine.schemas.is_clean() {
        return Err(CliError::load_failed(format!(
            "{} schema document(s) rejected",
            engine.schemas.rejected.len()
        )));
    }
    Ok(())
}

/// Validates one payload from stdin against `namespace`.
pub fn validate(config_path: &Path, namespace: &str) -> CliResult<()> {
    let engine = load_engine(config_path)?;
    let payload = read_document()?;

    match engine.assembler.validate(namespace, &payload) {
        Ok(validated) => {
            let mut fields = Map::new();
            for (name, field) in validated.fields() {
                fields.insert(
                    name.to_string(),
                    json!({ "value": field.value, "status": field.status }),
                );
            }
            let defaults: Map<String, Value> = validated
                .defaults()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect();

            write_response(&json!({
                "namespace": namespace,
                "fields": fields,
                "defaults": defaults,
            }))
        }
        Err(errors) => {
            let message = errors.to_string();
            write_error_with_details(CliErrorCode::ValidationFailed.code(), &message, &errors)?;
            Err(CliError::validation_failed(message))
        }
    }
}

/// Serving loop over JSON-lines ingest requests.
///
/// A malformed line or a rejected payload gets an error response and the
/// loop continues. A stdin read error ends it.
pub fn ingest(config_path: &Path) -> CliResult<()> {
    let engine = load_engine(config_path)?;
    log_event_with_fields(Event::Serving, &[("command", "ingest")]);

    for line in read_lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                write_error(e.code_str(), e.message())?;
                break;
            }
        };

        let request: IngestRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                let err = CliError::bad_request(format!("Invalid ingest request: {}", e));
                write_error(err.code_str(), err.message())?;
                continue;
            }
        };

        let at = request.timestamp.unwrap_or_else(Utc::now);
        match engine
            .assembler
            .ingest(&request.profile_id, &request.namespace, &request.payload, at)
        {
            Ok(report) => write_response(&report)?,
            Err(IngestError::Validation(errors)) => {
                write_error_with_details(
                    CliErrorCode::ValidationFailed.code(),
                    &errors.to_string(),
                    &errors,
                )?;
            }
            Err(other) => {
                let err = CliError::from(other);
                write_error(err.code_str(), err.message())?;
            }
        }
    }

    let metrics = engine.metrics.to_json();
    log_event_with_fields(Event::IngestComplete, &[("metrics", metrics.as_str())]);
    Ok(())
}
