//! Applies validated payloads to a profile's extensions
//!
//! Merge rules:
//! - Every payload field overwrites `bag[namespace][field]`; a vendor always
//!   owns its own namespace
//! - Schema defaults fill only fields the namespace has never written
//! - No other namespace's values are read or written
//! - Non-null values of mapped fields append provenance under their canonical
//!   field, which is then reported as touched
//!
//! Merging the same payload at the same timestamp twice leaves the bag and
//! ledger as they were after the first merge.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::bag::ExtensionsBag;
use super::provenance::{ProvenanceEntry, ProvenanceLedger};
use super::value::ExtensionValue;
use crate::schema::{ValidatedPayload, ValidationStatus};
use crate::trust::{CanonicalFieldMap, TrustTable};

/// What one merge changed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeSummary {
    pub namespace: String,
    /// Payload fields written
    pub written: Vec<String>,
    /// Absent fields filled from schema defaults
    pub defaulted: Vec<String>,
    /// Fields the namespace schema does not define
    pub unschemad: Vec<String>,
    /// Canonical fields that received a provenance claim
    pub touched: BTreeSet<String>,
    /// Provenance entries actually appended
    pub provenance_appended: usize,
}

pub struct ExtensionMerger<'a> {
    mapping: &'a CanonicalFieldMap,
    trust: &'a TrustTable,
}

impl<'a> ExtensionMerger<'a> {
    pub fn new(mapping: &'a CanonicalFieldMap, trust: &'a TrustTable) -> Self {
        Self { mapping, trust }
    }

    pub fn merge(
        &self,
        bag: &mut ExtensionsBag,
        ledger: &mut ProvenanceLedger,
        payload: &ValidatedPayload,
        at: DateTime<Utc>,
    ) -> MergeSummary {
        let namespace = payload.namespace();
        let mut summary = MergeSummary {
            namespace: namespace.to_string(),
            ..MergeSummary::default()
        };

        for (name, field) in payload.fields() {
            bag.put(
                name,
                ExtensionValue::new(field.value.clone(), namespace, at, field.status),
            );
            summary.written.push(name.to_string());
            if field.status == ValidationStatus::Unschemad {
                summary.unschemad.push(name.to_string());
            }

            if field.value.is_null() {
                continue;
            }
            if let Some(canonical) = self.mapping.canonical_for(namespace, name) {
                let entry = ProvenanceEntry {
                    namespace: namespace.to_string(),
                    field: name.to_string(),
                    value: field.value.clone(),
                    trust: self.trust.score(namespace, name),
                    timestamp: at,
                };
                if ledger.append(canonical, entry) {
                    summary.provenance_appended += 1;
                }
                summary.touched.insert(canonical.to_string());
            }
        }

        for (name, default) in payload.defaults() {
            if bag.contains(namespace, name) {
                continue;
            }
            bag.put(
                name,
                ExtensionValue::new(default.clone(), namespace, at, ValidationStatus::Defaulted),
            );
            summary.defaulted.push(name.to_string());
        }

        summary
    }
}
