//! Errors for the canonical map and trust table

use thiserror::Error;

pub type TableResult<T> = Result<T, TableError>;

/// A trust score that is negative, NaN or infinite
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("trust score must be finite and non-negative, got {0}")]
pub struct InvalidTrustScore(pub f64);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// File missing, unreadable, or not valid YAML/JSON for its shape
    #[error("cannot read table '{source_name}': {reason}")]
    Unreadable { source_name: String, reason: String },

    /// A map member that is not written as `namespace.field`
    #[error("invalid field reference '{0}', expected 'namespace.field'")]
    InvalidFieldRef(String),

    /// One vendor field listed under two canonical fields
    #[error("'{field_ref}' is mapped to both '{first}' and '{second}'")]
    DuplicateMapping {
        field_ref: String,
        first: String,
        second: String,
    },

    #[error("invalid trust score for '{location}': {source}")]
    InvalidScore {
        location: String,
        #[source]
        source: InvalidTrustScore,
    },
}

impl TableError {
    pub fn unreadable(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        TableError::Unreadable {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TableError::Unreadable { .. } => "EXT_TABLE_UNREADABLE",
            TableError::InvalidFieldRef(_) => "EXT_INVALID_FIELD_REF",
            TableError::DuplicateMapping { .. } => "EXT_DUPLICATE_MAPPING",
            TableError::InvalidScore { .. } => "EXT_INVALID_TRUST_SCORE",
        }
    }
}
