//! Engine counters
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Relaxed atomics; values are exact once writers are quiet

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    payloads_validated: AtomicU64,
    payloads_rejected: AtomicU64,
    unschemad_fields: AtomicU64,
    merges: AtomicU64,
    provenance_entries: AtomicU64,
    resolutions: AtomicU64,
    escalations: AtomicU64,
    review_items: AtomicU64,
    schemas_loaded: AtomicU64,
    schemas_rejected: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Validation

    pub fn increment_payloads_validated(&self) {
        self.payloads_validated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_payloads_rejected(&self) {
        self.payloads_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_unschemad_fields(&self, count: u64) {
        self.unschemad_fields.fetch_add(count, Ordering::Relaxed);
    }

    // Merge

    pub fn increment_merges(&self) {
        self.merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_provenance_entries(&self, count: u64) {
        self.provenance_entries.fetch_add(count, Ordering::Relaxed);
    }

    // Resolution

    pub fn increment_resolutions(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_escalations(&self) {
        self.escalations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_review_items(&self) {
        self.review_items.fetch_add(1, Ordering::Relaxed);
    }

    // Schemas

    pub fn add_schemas_loaded(&self, count: u64) {
        self.schemas_loaded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_schemas_rejected(&self, count: u64) {
        self.schemas_rejected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            payloads_validated: self.payloads_validated.load(Ordering::Relaxed),
            payloads_rejected: self.payloads_rejected.load(Ordering::Relaxed),
            unschemad_fields: self.unschemad_fields.load(Ordering::Relaxed),
            merges: self.merges.load(Ordering::Relaxed),
            provenance_entries: self.provenance_entries.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
            review_items: self.review_items.load(Ordering::Relaxed),
            schemas_loaded: self.schemas_loaded.load(Ordering::Relaxed),
            schemas_rejected: self.schemas_rejected.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| String::from("{}"))
    }
}

/// A point-in-time copy of every counter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub payloads_validated: u64,
    pub payloads_rejected: u64,
    pub unschemad_fields: u64,
    pub merges: u64,
    pub provenance_entries: u64,
    pub resolutions: u64,
    pub escalations: u64,
    pub review_items: u64,
    pub schemas_loaded: u64,
    pub schemas_rejected: u64,
}
