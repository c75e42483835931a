//! CLI argument definitions using clap
//!
//! Commands:
//! - extfield check --config <path>
//! - extfield validate --config <path> --namespace <ns>
//! - extfield ingest --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// extfield - vendor extension field engine
#[derive(Parser, Debug)]
#[command(name = "extfield")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load every schema and table and report what was accepted
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./extfield.json")]
        config: PathBuf,
    },

    /// Validate one payload read from stdin
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./extfield.json")]
        config: PathBuf,

        /// Vendor namespace the payload belongs to
        #[arg(long)]
        namespace: String,
    },

    /// Ingest JSON-lines payloads from stdin, one response per line
    Ingest {
        /// Path to configuration file
        #[arg(long, default_value = "./extfield.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
