//! Trust table: configured authority per (namespace, field)
//!
//! Document shape (YAML or JSON):
//!
//! ```yaml
//! default: 0.0
//! namespaces:
//!   epic:
//!     default: 0.8
//!     fields:
//!       patient_id: 0.9
//! ```
//!
//! Lookup falls back from the field entry to the namespace default to the
//! global default.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{TableError, TableResult};
use super::score::TrustScore;
use crate::schema::DocumentFormat;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamespaceTrust {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<TrustScore>,
    pub fields: BTreeMap<String, TrustScore>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrustTable {
    default: TrustScore,
    namespaces: BTreeMap<String, NamespaceTrust>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrustTable {
    #[serde(default)]
    default: Option<f64>,
    #[serde(default)]
    namespaces: BTreeMap<String, RawNamespaceTrust>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNamespaceTrust {
    #[serde(default)]
    default: Option<f64>,
    #[serde(default)]
    fields: BTreeMap<String, f64>,
}

fn checked(location: String, value: f64) -> TableResult<TrustScore> {
    TrustScore::new(value).map_err(|source| TableError::InvalidScore { location, source })
}

impl TrustTable {
    /// An empty table where every pair scores `default`.
    pub fn new(default: TrustScore) -> Self {
        Self {
            default,
            namespaces: BTreeMap::new(),
        }
    }

    pub fn with_namespace_default(mut self, namespace: &str, score: TrustScore) -> Self {
        self.namespaces.entry(namespace.to_string()).or_default().default = Some(score);
        self
    }

    pub fn with_field(mut self, namespace: &str, field: &str, score: TrustScore) -> Self {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .fields
            .insert(field.to_string(), score);
        self
    }

    /// Score for a (namespace, field) pair.
    pub fn score(&self, namespace: &str, field: &str) -> TrustScore {
        match self.namespaces.get(namespace) {
            Some(ns) => ns
                .fields
                .get(field)
                .copied()
                .or(ns.default)
                .unwrap_or(self.default),
            None => self.default,
        }
    }

    pub fn default_score(&self) -> TrustScore {
        self.default
    }

    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceTrust> {
        self.namespaces.get(namespace)
    }

    /// Parses a table document body.
    pub fn from_document(source_name: &str, text: &str, format: DocumentFormat) -> TableResult<Self> {
        let raw: RawTrustTable = format
            .parse(text)
            .map_err(|e| TableError::unreadable(source_name, e))?;

        let mut table = TrustTable::new(checked("default".into(), raw.default.unwrap_or(0.0))?);
        for (ns, raw_ns) in raw.namespaces {
            let mut entry = NamespaceTrust::default();
            if let Some(value) = raw_ns.default {
                entry.default = Some(checked(format!("{}.default", ns), value)?);
            }
            for (field, value) in raw_ns.fields {
                let score = checked(format!("{}.{}", ns, field), value)?;
                entry.fields.insert(field, score);
            }
            table.namespaces.insert(ns, entry);
        }
        Ok(table)
    }

    /// Reads a table file; the format follows the file extension.
    pub fn load(path: &Path) -> TableResult<Self> {
        let source_name = path.display().to_string();
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| TableError::unreadable(&source_name, "unsupported file extension"))?;
        let text = fs::read_to_string(path)
            .map_err(|e| TableError::unreadable(&source_name, format!("Failed to read file: {}", e)))?;
        Self::from_document(&source_name, &text, format)
    }
}
