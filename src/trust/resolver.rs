//! Trust-based conflict resolution
//!
//! A pure decision over one provenance record and the trust table as
//! configured now:
//!
//! 1. Candidates are the latest claim of each (namespace, field)
//! 2. Each candidate is scored with the current trust table
//! 3. The top-trust candidates lead; if they all assert the same value it
//!    resolves to the first of them in namespace order
//! 4. Otherwise the field needs review, with the leaders as candidates
//!
//! Timestamps pick each source's latest claim but never decide between
//! sources, and nothing is silently overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::score::TrustScore;
use super::table::TrustTable;
use crate::extensions::ProvenanceRecord;

/// One source's current claim on a canonical field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub namespace: String,
    pub field: String,
    pub value: Value,
    pub trust: TrustScore,
    pub asserted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved {
        value: Value,
        namespace: String,
        field: String,
        trust: TrustScore,
    },
    NeedsReview { candidates: Vec<Candidate> },
}

impl ResolutionOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionOutcome::Resolved { .. })
    }

    pub fn needs_review(&self) -> bool {
        !self.is_resolved()
    }
}

pub struct TrustResolver;

impl TrustResolver {
    /// Current claims of `record`, scored with `table`, in namespace then
    /// field order.
    pub fn candidates(record: &ProvenanceRecord, table: &TrustTable) -> Vec<Candidate> {
        record
            .latest_per_source()
            .into_iter()
            .map(|entry| Candidate {
                namespace: entry.namespace.clone(),
                field: entry.field.clone(),
                value: entry.value.clone(),
                trust: table.score(&entry.namespace, &entry.field),
                asserted_at: entry.timestamp,
            })
            .collect()
    }

    /// Classifies one canonical field. An empty record needs review with no
    /// candidates.
    pub fn resolve(record: &ProvenanceRecord, table: &TrustTable) -> ResolutionOutcome {
        let candidates = Self::candidates(record, table);
        let top = candidates
            .iter()
            .map(|c| c.trust)
            .max()
            .unwrap_or(TrustScore::ZERO);
        let leaders: Vec<Candidate> = candidates.into_iter().filter(|c| c.trust == top).collect();

        match leaders.split_first() {
            Some((first, rest)) if rest.iter().all(|c| c.value == first.value) => {
                ResolutionOutcome::Resolved {
                    value: first.value.clone(),
                    namespace: first.namespace.clone(),
                    field: first.field.clone(),
                    trust: first.trust,
                }
            }
            _ => ResolutionOutcome::NeedsReview { candidates: leaders },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::ProvenanceEntry;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn score(v: f64) -> TrustScore {
        TrustScore::new(v).unwrap()
    }

    fn claim(record: &mut ProvenanceRecord, ns: &str, field: &str, value: Value, secs: i64) {
        let base = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        record.append(ProvenanceEntry {
            namespace: ns.to_string(),
            field: field.to_string(),
            value,
            trust: TrustScore::ZERO,
            timestamp: base + Duration::seconds(secs),
        });
    }

    fn table(epic: f64, cerner: f64) -> TrustTable {
        TrustTable::new(TrustScore::ZERO)
            .with_field("epic", "patient_id", score(epic))
            .with_field("cerner", "mrn", score(cerner))
    }

    #[test]
    fn test_higher_trust_wins() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "epic", "patient_id", json!("A1"), 0);
        claim(&mut record, "cerner", "mrn", json!("B2"), 10);

        match TrustResolver::resolve(&record, &table(0.9, 0.4)) {
            ResolutionOutcome::Resolved { value, namespace, .. } => {
                assert_eq!(value, json!("A1"));
                assert_eq!(namespace, "epic");
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_tied_trust_disagreeing_needs_review() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "epic", "patient_id", json!("A1"), 0);
        claim(&mut record, "cerner", "mrn", json!("B2"), 10);

        match TrustResolver::resolve(&record, &table(0.9, 0.9)) {
            ResolutionOutcome::NeedsReview { candidates } => {
                let pairs: Vec<(&str, &Value)> = candidates
                    .iter()
                    .map(|c| (c.namespace.as_str(), &c.value))
                    .collect();
                assert_eq!(pairs, [("cerner", &json!("B2")), ("epic", &json!("A1"))]);
            }
            other => panic!("expected review, got {:?}", other),
        }
    }

    #[test]
    fn test_agreeing_sources_resolve_to_most_trusted() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "cerner", "mrn", json!("SAME"), 0);
        claim(&mut record, "epic", "patient_id", json!("SAME"), 0);

        match TrustResolver::resolve(&record, &table(0.3, 0.6)) {
            ResolutionOutcome::Resolved { namespace, .. } => assert_eq!(namespace, "cerner"),
            other => panic!("expected resolution, got {:?}", other),
        }
        match TrustResolver::resolve(&record, &table(0.5, 0.5)) {
            ResolutionOutcome::Resolved { namespace, .. } => assert_eq!(namespace, "cerner"),
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_trust_disagreement_does_not_block() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "epic", "patient_id", json!("A1"), 0);
        claim(&mut record, "cerner", "mrn", json!("B2"), 0);
        claim(&mut record, "hint", "patient_id", json!("A1"), 0);

        let table = table(0.9, 0.1).with_field("hint", "patient_id", score(0.9));
        assert!(TrustResolver::resolve(&record, &table).is_resolved());
    }

    #[test]
    fn test_only_latest_claim_per_source_counts() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "epic", "patient_id", json!("OLD"), 0);
        claim(&mut record, "epic", "patient_id", json!("NEW"), 5);
        claim(&mut record, "cerner", "mrn", json!("NEW"), 1);

        match TrustResolver::resolve(&record, &table(0.5, 0.5)) {
            ResolutionOutcome::Resolved { value, .. } => assert_eq!(value, json!("NEW")),
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_uses_trust_at_resolution_time() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "epic", "patient_id", json!("A1"), 0);
        claim(&mut record, "cerner", "mrn", json!("B2"), 0);

        assert!(TrustResolver::resolve(&record, &table(0.5, 0.5)).needs_review());
        assert!(TrustResolver::resolve(&record, &table(0.5, 0.6)).is_resolved());
    }

    #[test]
    fn test_empty_record_needs_review() {
        let outcome = TrustResolver::resolve(&ProvenanceRecord::new(), &table(0.5, 0.5));
        assert_eq!(outcome, ResolutionOutcome::NeedsReview { candidates: vec![] });
    }

    #[test]
    fn test_resolution_leaves_record_unchanged() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "epic", "patient_id", json!("A1"), 0);
        claim(&mut record, "cerner", "mrn", json!("B2"), 0);
        let before = record.clone();

        TrustResolver::resolve(&record, &table(0.9, 0.4));
        assert_eq!(record, before);
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let mut record = ProvenanceRecord::new();
        claim(&mut record, "epic", "patient_id", json!("A1"), 0);
        let json = serde_json::to_value(TrustResolver::resolve(&record, &table(0.9, 0.4))).unwrap();
        assert_eq!(json["outcome"], "resolved");
        assert_eq!(json["namespace"], "epic");
    }
}
