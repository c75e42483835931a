//! Schema and payload validation error types
//!
//! Schema error codes (definition side):
//! - EXT_SCHEMA_MALFORMED: a namespace definition was rejected at load time
//! - EXT_UNKNOWN_NAMESPACE: no schema is registered for the namespace
//! - EXT_SCHEMA_UNREADABLE: a definition document could not be read or parsed
//!
//! Payload validation errors are reported as a complete list, never just the
//! first problem found.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Definition is structurally invalid
    MalformedSchema,
    /// Namespace has no registered schema
    UnknownNamespace,
    /// Definition document could not be read or parsed at all
    UnreadableDocument,
}

impl SchemaErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::MalformedSchema => "EXT_SCHEMA_MALFORMED",
            SchemaErrorCode::UnknownNamespace => "EXT_UNKNOWN_NAMESPACE",
            SchemaErrorCode::UnreadableDocument => "EXT_SCHEMA_UNREADABLE",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with full context
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    namespace: Option<String>,
    field: Option<String>,
}

impl SchemaError {
    /// A namespace definition is malformed as a whole
    pub fn malformed(namespace: Option<&str>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let message = match namespace {
            Some(ns) => format!("Malformed schema for namespace '{}': {}", ns, reason),
            None => format!("Malformed schema: {}", reason),
        };
        Self {
            code: SchemaErrorCode::MalformedSchema,
            message,
            namespace: namespace.map(str::to_string),
            field: None,
        }
    }

    /// A single field definition is malformed
    pub fn malformed_field(namespace: &str, field: &str, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MalformedSchema,
            message: format!(
                "Malformed field '{}' in namespace '{}': {}",
                field,
                namespace,
                reason.into()
            ),
            namespace: Some(namespace.to_string()),
            field: Some(field.to_string()),
        }
    }

    /// No schema registered for the namespace
    pub fn unknown_namespace(namespace: impl Into<String>) -> Self {
        let ns = namespace.into();
        Self {
            code: SchemaErrorCode::UnknownNamespace,
            message: format!("Namespace '{}' has no registered schema", ns),
            namespace: Some(ns),
            field: None,
        }
    }

    /// A definition document could not be read or parsed
    pub fn unreadable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::UnreadableDocument,
            message: format!(
                "Unreadable schema document '{}': {}",
                source.into(),
                reason.into()
            ),
            namespace: None,
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the namespace if applicable
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the offending field path if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A single payload-level validation problem.
///
/// `path` uses dots for nested properties and `[i]` for array elements,
/// e.g. `address.zip_code` or `allergies[2].code`.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("unknown namespace '{namespace}'")]
    UnknownNamespace { namespace: String },

    #[error("field '{path}': required field is missing")]
    MissingRequiredField { path: String },

    #[error("field '{path}': expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("field '{path}': value does not match pattern '{pattern}'")]
    PatternMismatch { path: String, pattern: String },

    #[error("field '{path}': length {length} outside {}", describe_bounds(.min, .max))]
    LengthOutOfRange {
        path: String,
        length: usize,
        min: Option<usize>,
        max: Option<usize>,
    },

    #[error("field '{path}': {value} outside {}", describe_bounds(.minimum, .maximum))]
    NumberOutOfRange {
        path: String,
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },

    #[error("field '{path}': {value} is not one of {}", describe_allowed(.allowed))]
    NotInEnum {
        path: String,
        value: Value,
        allowed: Vec<Value>,
    },
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::UnknownNamespace { .. } => "UNKNOWN_NAMESPACE",
            ValidationError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            ValidationError::TypeMismatch { .. } => "TYPE_MISMATCH",
            ValidationError::PatternMismatch { .. } => "PATTERN_MISMATCH",
            ValidationError::LengthOutOfRange { .. } => "LENGTH_OUT_OF_RANGE",
            ValidationError::NumberOutOfRange { .. } => "NUMBER_OUT_OF_RANGE",
            ValidationError::NotInEnum { .. } => "NOT_IN_ENUM",
        }
    }

    /// Field path the error refers to (`$root` for payload-level errors)
    pub fn path(&self) -> &str {
        match self {
            ValidationError::UnknownNamespace { .. } => "$root",
            ValidationError::MissingRequiredField { path }
            | ValidationError::TypeMismatch { path, .. }
            | ValidationError::PatternMismatch { path, .. }
            | ValidationError::LengthOutOfRange { path, .. }
            | ValidationError::NumberOutOfRange { path, .. }
            | ValidationError::NotInEnum { path, .. } => path,
        }
    }
}

fn describe_bounds<T: fmt::Display>(min: &Option<T>, max: &Option<T>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) => format!("[{}, {}]", lo, hi),
        (Some(lo), None) => format!(">= {}", lo),
        (None, Some(hi)) => format!("<= {}", hi),
        (None, None) => "unbounded range".to_string(),
    }
}

fn describe_allowed(allowed: &[Value]) -> String {
    let items: Vec<String> = allowed.iter().map(Value::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// The complete set of problems found in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Errors reported against the given path
    pub fn for_path<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.0.iter().filter(move |e| e.path() == path)
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payload failed validation with {} error(s)", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}", sep, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
