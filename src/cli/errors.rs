//! CLI-specific error types
//!
//! A CLI error ends the command with a non-zero exit code.

use std::fmt;
use std::io;

use crate::profile::IngestError;
use crate::schema::SchemaError;
use crate::trust::TableError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// A request line that is not a valid request
    BadRequest,
    /// Schema or table that did not load
    LoadFailed,
    /// Payload failed validation
    ValidationFailed,
    /// Ingest failed after validation
    IngestFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "EXT_CLI_CONFIG_ERROR",
            Self::IoError => "EXT_CLI_IO_ERROR",
            Self::BadRequest => "EXT_CLI_BAD_REQUEST",
            Self::LoadFailed => "EXT_CLI_LOAD_FAILED",
            Self::ValidationFailed => "EXT_VALIDATION_FAILED",
            Self::IngestFailed => "EXT_CLI_INGEST_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BadRequest, msg)
    }

    pub fn load_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::LoadFailed, msg)
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ValidationFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::load_failed(e.to_string())
    }
}

impl From<TableError> for CliError {
    fn from(e: TableError) -> Self {
        Self::load_failed(e.to_string())
    }
}

impl From<IngestError> for CliError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Validation(errors) => Self::validation_failed(errors.to_string()),
            other => Self::new(CliErrorCode::IngestFailed, other.to_string()),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
