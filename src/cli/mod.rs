//! CLI module for extfield
//!
//! - check: load schemas and tables, report what was accepted
//! - validate: validate one payload from stdin
//! - ingest: JSON-lines serving loop over stdin

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, ingest, run, run_command, validate, IngestRequest};
pub use config::{Engine, EngineConfig};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_envelope, ok_envelope, write_error, write_response};
