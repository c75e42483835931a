//! Provenance ledger
//!
//! An append-only audit trail per canonical field of which namespace
//! asserted which value, when, and with what configured trust. Entries are
//! never removed or rewritten; resolution reads them and nothing else.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::trust::TrustScore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub namespace: String,
    pub field: String,
    pub value: Value,
    /// Trust configured for (namespace, field) when the entry was written
    pub trust: TrustScore,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceRecord {
    entries: Vec<ProvenanceEntry>,
}

impl ProvenanceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. An entry equal to one already present is not
    /// appended again; returns whether the record grew.
    pub fn append(&mut self, entry: ProvenanceEntry) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// All entries in append order
    pub fn entries(&self) -> &[ProvenanceEntry] {
        &self.entries
    }

    /// The latest entry of each (namespace, field), ordered by namespace
    /// then field.
    ///
    /// Latest means the newest timestamp; among equal timestamps the entry
    /// appended last.
    pub fn latest_per_source(&self) -> Vec<&ProvenanceEntry> {
        let mut latest: BTreeMap<(&str, &str), &ProvenanceEntry> = BTreeMap::new();
        for entry in &self.entries {
            let key = (entry.namespace.as_str(), entry.field.as_str());
            match latest.get(&key) {
                Some(current) if current.timestamp > entry.timestamp => {}
                _ => {
                    latest.insert(key, entry);
                }
            }
        }
        latest.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical field -> provenance record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvenanceLedger(BTreeMap<String, ProvenanceRecord>);

impl ProvenanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the record of `canonical`, creating it on first use.
    pub fn append(&mut self, canonical: &str, entry: ProvenanceEntry) -> bool {
        self.0.entry(canonical.to_string()).or_default().append(entry)
    }

    pub fn record(&self, canonical: &str) -> Option<&ProvenanceRecord> {
        self.0.get(canonical)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProvenanceRecord)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn canonical_fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
