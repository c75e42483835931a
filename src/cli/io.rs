//! JSON I/O handling for CLI
//!
//! - Input: JSON via stdin, one document (validate) or one per line (ingest)
//! - Output: one JSON envelope per response on stdout
//! - Logs go to stderr, never stdout

use std::io::{self, BufRead, Read, Write};

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Reads the whole of stdin as one JSON document.
pub fn read_document() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Non-blank lines of stdin; read errors end the stream.
pub fn read_lines() -> impl Iterator<Item = CliResult<String>> {
    io::stdin()
        .lock()
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

pub fn ok_envelope<T: Serialize>(data: &T) -> CliResult<Value> {
    Ok(json!({
        "status": "ok",
        "data": serde_json::to_value(data)?
    }))
}

pub fn error_envelope(code: &str, message: &str, errors: Option<Value>) -> Value {
    let mut response = json!({
        "status": "error",
        "code": code,
        "message": message
    });
    if let (Some(errors), Some(obj)) = (errors, response.as_object_mut()) {
        obj.insert("errors".to_string(), errors);
    }
    response
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Writes a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    write_line(&ok_envelope(data)?)
}

/// Writes an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_envelope(code, message, None))
}

/// Writes an error response carrying a detailed error list
pub fn write_error_with_details<T: Serialize>(code: &str, message: &str, errors: &T) -> CliResult<()> {
    let details = serde_json::to_value(errors)?;
    write_line(&error_envelope(code, message, Some(details)))
}
