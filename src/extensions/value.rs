use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::ValidationStatus;

/// One stored vendor value inside a profile's extensions bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionValue {
    pub value: Value,
    pub source_namespace: String,
    pub updated_at: DateTime<Utc>,
    pub status: ValidationStatus,
}

impl ExtensionValue {
    pub fn new(value: Value, source_namespace: impl Into<String>, updated_at: DateTime<Utc>, status: ValidationStatus) -> Self {
        Self {
            value,
            source_namespace: source_namespace.into(),
            updated_at,
            status,
        }
    }

    /// Whether the value carries data (not null, not an empty string)
    pub fn is_filled(&self) -> bool {
        match &self.value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }
}
