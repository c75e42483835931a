//! Profile assembler
//!
//! Orchestrates one payload end to end:
//!
//! 1. Validate against the current schema snapshot (no lock held)
//! 2. Take the profile's lock and load its extensions
//! 3. Merge into the namespace bag, appending provenance
//! 4. Re-resolve every canonical field the merge touched
//! 5. Hand review items to the queue, then save
//!
//! If the queue refuses an item the profile is not saved, so a retry raises
//! the same conflicts again. Delivery is at least once.
//!
//! A payload that fails validation changes nothing. The canonical map and
//! trust table are read once per payload, so a concurrent reload applies to
//! the whole payload or not at all.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::locks::ProfileLocks;
use super::record::{CanonicalState, ProfileExtensions};
use super::repository::{ProfileRepository, RepositoryError};
use super::review::{ReviewError, ReviewItem, ReviewQueue};
use crate::extensions::{ExtensionMerger, MergeSummary};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::quality::{QualityScore, QualityScorer};
use crate::schema::{SchemaRegistry, SchemaValidator, ValidatedPayload, ValidationErrors};
use crate::trust::{CanonicalFieldMap, ResolutionOutcome, TrustResolver, TrustTable};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("payload rejected: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Review(#[from] ReviewError),
}

impl IngestError {
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Validation(_) => "EXT_VALIDATION_FAILED",
            IngestError::Repository(_) => "EXT_REPOSITORY_FAILED",
            IngestError::Review(_) => "EXT_REVIEW_QUEUE_FAILED",
        }
    }
}

/// Result of ingesting one payload
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub profile_id: String,
    pub ingested_at: DateTime<Utc>,
    pub merge: MergeSummary,
    /// Outcome for every canonical field the payload touched
    pub resolutions: BTreeMap<String, ResolutionOutcome>,
    /// Ids of review items raised by this payload
    pub review_items: Vec<Uuid>,
    pub quality: QualityScore,
    pub profile: ProfileExtensions,
}

/// Result of re-resolving a stored profile against the current trust table
#[derive(Debug, Clone, Serialize)]
pub struct ResolveReport {
    pub profile_id: String,
    pub resolutions: BTreeMap<String, ResolutionOutcome>,
    pub review_items: Vec<Uuid>,
}

pub struct ProfileAssembler {
    registry: Arc<SchemaRegistry>,
    mapping: ArcSwap<CanonicalFieldMap>,
    trust: ArcSwap<TrustTable>,
    repository: Arc<dyn ProfileRepository>,
    review_queue: Arc<dyn ReviewQueue>,
    locks: ProfileLocks,
    metrics: Arc<MetricsRegistry>,
    scorer: QualityScorer,
}

impl ProfileAssembler {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        mapping: CanonicalFieldMap,
        trust: TrustTable,
        repository: Arc<dyn ProfileRepository>,
        review_queue: Arc<dyn ReviewQueue>,
    ) -> Self {
        Self {
            registry,
            mapping: ArcSwap::from_pointee(mapping),
            trust: ArcSwap::from_pointee(trust),
            repository,
            review_queue,
            locks: ProfileLocks::new(),
            metrics: Arc::new(MetricsRegistry::new()),
            scorer: QualityScorer::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_scorer(mut self, scorer: QualityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn mapping(&self) -> Arc<CanonicalFieldMap> {
        self.mapping.load_full()
    }

    pub fn trust_table(&self) -> Arc<TrustTable> {
        self.trust.load_full()
    }

    /// Swaps in a new canonical map. Payloads already in flight finish with
    /// the map they started with.
    pub fn reload_mapping(&self, mapping: CanonicalFieldMap) {
        let count = mapping.len().to_string();
        self.mapping.store(Arc::new(mapping));
        log_event_with_fields(
            Event::TablesReloaded,
            &[("table", "canonical_fields"), ("entries", count.as_str())],
        );
    }

    /// Swaps in a new trust table. Stored canonical states keep their last
    /// resolution until the profile is written again or `resolve_profile` runs.
    pub fn reload_trust(&self, trust: TrustTable) {
        self.trust.store(Arc::new(trust));
        log_event_with_fields(Event::TablesReloaded, &[("table", "trust_scores")]);
    }

    /// Validates without touching any profile.
    pub fn validate(&self, namespace: &str, payload: &Value) -> Result<ValidatedPayload, ValidationErrors> {
        let result = SchemaValidator::new(&self.registry).validate(namespace, payload);
        match &result {
            Ok(validated) => {
                self.metrics.increment_payloads_validated();
                let count = validated.len().to_string();
                log_event_with_fields(
                    Event::PayloadValidated,
                    &[("namespace", namespace), ("fields", count.as_str())],
                );
            }
            Err(errors) => {
                self.metrics.increment_payloads_rejected();
                let count = errors.len().to_string();
                log_event_with_fields(
                    Event::PayloadRejected,
                    &[("namespace", namespace), ("errors", count.as_str())],
                );
            }
        }
        result
    }

    /// Validates, merges and resolves one vendor payload for a profile.
    pub fn ingest(
        &self,
        profile_id: &str,
        namespace: &str,
        payload: &Value,
        at: DateTime<Utc>,
    ) -> Result<IngestReport, IngestError> {
        log_event_with_fields(
            Event::IngestBegin,
            &[("profile_id", profile_id), ("namespace", namespace)],
        );

        let validated = self.validate(namespace, payload)?;
        let mapping = self.mapping.load_full();
        let trust = self.trust.load_full();

        let report = self.with_profile_lock(profile_id, || {
            self.ingest_locked(profile_id, namespace, &validated, &mapping, &trust, at)
        })?;

        let written = report.merge.written.len().to_string();
        log_event_with_fields(
            Event::IngestComplete,
            &[
                ("profile_id", profile_id),
                ("namespace", namespace),
                ("fields", written.as_str()),
            ],
        );
        Ok(report)
    }

    fn ingest_locked(
        &self,
        profile_id: &str,
        namespace: &str,
        validated: &ValidatedPayload,
        mapping: &CanonicalFieldMap,
        trust: &TrustTable,
        at: DateTime<Utc>,
    ) -> Result<IngestReport, IngestError> {
        let mut profile = self.repository.load(profile_id)?.unwrap_or_default();
        let merge = ExtensionMerger::new(mapping, trust).merge(
            &mut profile.extensions,
            &mut profile.provenance,
            validated,
            at,
        );
        self.metrics.increment_merges();
        self.metrics.add_provenance_entries(merge.provenance_appended as u64);
        let written = merge.written.len().to_string();
        log_event_with_fields(
            Event::ExtensionsMerged,
            &[
                ("profile_id", profile_id),
                ("namespace", namespace),
                ("written", written.as_str()),
            ],
        );
        for canonical in &merge.touched {
            log_event_with_fields(
                Event::ProvenanceAppended,
                &[("profile_id", profile_id), ("canonical_field", canonical.as_str())],
            );
        }

        let mut pending = Vec::new();
        for field in &merge.unschemad {
            let value = validated
                .field(field)
                .map(|f| f.value.clone())
                .unwrap_or(Value::Null);
            log_event_with_fields(
                Event::UnschemadFieldSeen,
                &[("namespace", namespace), ("field", field.as_str())],
            );
            pending.push(ReviewItem::unschemad_field(profile_id, namespace, field, value, at));
        }
        self.metrics.add_unschemad_fields(merge.unschemad.len() as u64);

        let resolutions = self.resolve_touched(
            profile_id,
            &mut profile,
            merge.touched.iter().map(String::as_str),
            trust,
            at,
            &mut pending,
        );

        let quality = self
            .scorer
            .score(&profile, &self.registry.snapshot(), at);

        // a conflict's pending state is stored only once the reviewer has it
        let review_items = self.submit_all(pending)?;
        self.repository.save(profile_id, &profile)?;

        Ok(IngestReport {
            profile_id: profile_id.to_string(),
            ingested_at: at,
            merge,
            resolutions,
            review_items,
            quality,
            profile,
        })
    }

    /// Re-resolves every canonical field of a stored profile with the trust
    /// table as configured now. Returns `None` for an unknown profile.
    pub fn resolve_profile(&self, profile_id: &str, at: DateTime<Utc>) -> Result<Option<ResolveReport>, IngestError> {
        let trust = self.trust.load_full();
        self.with_profile_lock(profile_id, || -> Result<Option<ResolveReport>, IngestError> {
            let Some(mut profile) = self.repository.load(profile_id)? else {
                return Ok(None);
            };

            let canonical: Vec<String> = profile.provenance.canonical_fields().map(String::from).collect();
            let mut pending = Vec::new();
            let resolutions = self.resolve_touched(
                profile_id,
                &mut profile,
                canonical.iter().map(String::as_str),
                &trust,
                at,
                &mut pending,
            );

            let review_items = self.submit_all(pending)?;
            self.repository.save(profile_id, &profile)?;

            Ok(Some(ResolveReport {
                profile_id: profile_id.to_string(),
                resolutions,
                review_items,
            }))
        })
    }

    pub fn profile(&self, profile_id: &str) -> Result<Option<ProfileExtensions>, IngestError> {
        Ok(self.repository.load(profile_id)?)
    }

    /// Resolves each canonical field and records its new state. A conflict is
    /// queued only when its candidate set differs from the pending one.
    fn resolve_touched<'a>(
        &self,
        profile_id: &str,
        profile: &mut ProfileExtensions,
        canonical: impl Iterator<Item = &'a str>,
        trust: &TrustTable,
        at: DateTime<Utc>,
        pending: &mut Vec<ReviewItem>,
    ) -> BTreeMap<String, ResolutionOutcome> {
        let mut resolutions = BTreeMap::new();
        for name in canonical {
            let Some(record) = profile.provenance.record(name) else {
                continue;
            };
            let outcome = TrustResolver::resolve(record, trust);
            let state = CanonicalState::from(outcome.clone());

            match &outcome {
                ResolutionOutcome::Resolved { namespace, .. } => {
                    self.metrics.increment_resolutions();
                    log_event_with_fields(
                        Event::ConflictResolved,
                        &[
                            ("profile_id", profile_id),
                            ("canonical_field", name),
                            ("winner", namespace.as_str()),
                        ],
                    );
                }
                ResolutionOutcome::NeedsReview { candidates } => {
                    self.metrics.increment_escalations();
                    let count = candidates.len().to_string();
                    log_event_with_fields(
                        Event::ConflictEscalated,
                        &[
                            ("profile_id", profile_id),
                            ("canonical_field", name),
                            ("candidates", count.as_str()),
                        ],
                    );
                    if profile.canonical.get(name) != Some(&state) {
                        pending.push(ReviewItem::conflict(profile_id, name, candidates.clone(), at));
                    }
                }
            }

            profile.canonical.insert(name.to_string(), state);
            resolutions.insert(name.to_string(), outcome);
        }
        resolutions
    }

    /// Runs `f` holding the profile's lock, then drops the lock entry if no
    /// other caller is waiting on it.
    fn with_profile_lock<T>(&self, profile_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.locks.lock_for(profile_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        self.locks.release(profile_id);
        result
    }

    fn submit_all(&self, items: Vec<ReviewItem>) -> Result<Vec<Uuid>, ReviewError> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id();
            self.review_queue.submit(item)?;
            self.metrics.increment_review_items();
            let id_text = id.to_string();
            log_event_with_fields(Event::ReviewQueued, &[("id", id_text.as_str())]);
            ids.push(id);
        }
        Ok(ids)
    }
}
