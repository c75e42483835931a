use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extensions::{ExtensionsBag, ProvenanceLedger};
use crate::trust::{Candidate, ResolutionOutcome, TrustScore};

/// Recorded state of a canonical field after its last resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CanonicalState {
    Resolved {
        value: Value,
        namespace: String,
        field: String,
        trust: TrustScore,
    },
    PendingReview { candidates: Vec<Candidate> },
}

impl CanonicalState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, CanonicalState::Resolved { .. })
    }
}

impl From<ResolutionOutcome> for CanonicalState {
    fn from(outcome: ResolutionOutcome) -> Self {
        match outcome {
            ResolutionOutcome::Resolved {
                value,
                namespace,
                field,
                trust,
            } => CanonicalState::Resolved {
                value,
                namespace,
                field,
                trust,
            },
            ResolutionOutcome::NeedsReview { candidates } => CanonicalState::PendingReview { candidates },
        }
    }
}

/// Everything persisted for one profile's vendor data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileExtensions {
    pub extensions: ExtensionsBag,
    pub provenance: ProvenanceLedger,
    pub canonical: BTreeMap<String, CanonicalState>,
}

impl ProfileExtensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The winning value of a canonical field, if it is resolved
    pub fn canonical_value(&self, canonical: &str) -> Option<&Value> {
        match self.canonical.get(canonical) {
            Some(CanonicalState::Resolved { value, .. }) => Some(value),
            _ => None,
        }
    }

    pub fn pending_review(&self) -> impl Iterator<Item = &str> {
        self.canonical
            .iter()
            .filter(|(_, state)| !state.is_resolved())
            .map(|(name, _)| name.as_str())
    }
}
