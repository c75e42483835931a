//! Canonical field map
//!
//! Declares which vendor fields assert the same cross-vendor concept:
//!
//! ```yaml
//! canonical_fields:
//!   member_external_id: [epic.patient_id, cerner.mrn, hint.patient_id]
//! ```
//!
//! Equivalence comes only from this map; similar field names mean nothing.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize, Serializer};

use super::errors::{TableError, TableResult};
use crate::schema::DocumentFormat;

/// A (namespace, field) pair, written `namespace.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRef {
    pub namespace: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(namespace: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            field: field.into(),
        }
    }

    /// Parses `namespace.field`. The namespace ends at the first dot.
    pub fn parse(text: &str) -> TableResult<Self> {
        match text.split_once('.') {
            Some((ns, field)) if !ns.is_empty() && !field.is_empty() => Ok(Self::new(ns, field)),
            _ => Err(TableError::InvalidFieldRef(text.to_string())),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.field)
    }
}

impl Serialize for FieldRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalFieldMap {
    canonical_fields: BTreeMap<String, Vec<FieldRef>>,
    #[serde(skip)]
    by_source: HashMap<FieldRef, String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCanonicalMap {
    #[serde(default)]
    canonical_fields: BTreeMap<String, Vec<String>>,
}

impl CanonicalFieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `source` to `canonical`.
    ///
    /// Mapping the same pair again is a no-op. A pair already mapped to a
    /// different canonical field is rejected.
    pub fn insert(&mut self, canonical: &str, source: FieldRef) -> TableResult<()> {
        if let Some(existing) = self.by_source.get(&source) {
            if existing == canonical {
                return Ok(());
            }
            return Err(TableError::DuplicateMapping {
                field_ref: source.to_string(),
                first: existing.clone(),
                second: canonical.to_string(),
            });
        }
        self.by_source.insert(source.clone(), canonical.to_string());
        self.canonical_fields
            .entry(canonical.to_string())
            .or_default()
            .push(source);
        Ok(())
    }

    /// Builder form of `insert` taking `namespace.field` strings.
    pub fn with_canonical(mut self, canonical: &str, members: &[&str]) -> TableResult<Self> {
        for member in members {
            self.insert(canonical, FieldRef::parse(member)?)?;
        }
        Ok(self)
    }

    /// The canonical field a vendor field asserts, if any.
    pub fn canonical_for(&self, namespace: &str, field: &str) -> Option<&str> {
        self.by_source
            .get(&FieldRef::new(namespace, field))
            .map(String::as_str)
    }

    /// Vendor fields mapped to `canonical`, in declaration order.
    pub fn members(&self, canonical: &str) -> &[FieldRef] {
        self.canonical_fields
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn canonical_fields(&self) -> impl Iterator<Item = &str> {
        self.canonical_fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.canonical_fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_fields.is_empty()
    }

    pub fn from_document(source_name: &str, text: &str, format: DocumentFormat) -> TableResult<Self> {
        let raw: RawCanonicalMap = format
            .parse(text)
            .map_err(|e| TableError::unreadable(source_name, e))?;

        let mut map = CanonicalFieldMap::new();
        for (canonical, members) in raw.canonical_fields {
            for member in members {
                map.insert(&canonical, FieldRef::parse(&member)?)?;
            }
        }
        Ok(map)
    }

    pub fn load(path: &Path) -> TableResult<Self> {
        let source_name = path.display().to_string();
        let format = DocumentFormat::from_path(path)
            .ok_or_else(|| TableError::unreadable(&source_name, "unsupported file extension"))?;
        let text = fs::read_to_string(path)
            .map_err(|e| TableError::unreadable(&source_name, format!("Failed to read file: {}", e)))?;
        Self::from_document(&source_name, &text, format)
    }
}
