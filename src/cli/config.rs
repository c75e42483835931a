//! Engine configuration file
//!
//! ```json
//! {
//!   "schema_dir": "schemas",
//!   "canonical_fields": "canonical_fields.yaml",
//!   "trust_scores": "trust_scores.yaml",
//!   "review_queue": "review.jsonl",
//!   "quality": { "max_age_days": 30 }
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::profile::{
    JsonLinesReviewQueue, MemoryProfileRepository, MemoryReviewQueue, ProfileAssembler, ReviewQueue,
};
use crate::quality::{QualityConfig, QualityScorer};
use crate::schema::{LoadReport, SchemaRegistry};
use crate::trust::{CanonicalFieldMap, TrustTable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory of schema definition documents (required)
    pub schema_dir: PathBuf,

    /// Canonical field map document (required)
    pub canonical_fields: PathBuf,

    /// Trust table document (required)
    pub trust_scores: PathBuf,

    /// JSON-lines file receiving review items (optional, in-memory if absent)
    #[serde(default)]
    pub review_queue: Option<PathBuf>,

    #[serde(default)]
    pub quality: QualityConfig,
}

impl EngineConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.validate()?;

        let schema_dir = config.schema_dir.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("schema_dir", schema_dir.as_str())]);
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.schema_dir);
        join(&mut self.canonical_fields);
        join(&mut self.trust_scores);
        if let Some(queue) = self.review_queue.as_mut() {
            join(queue);
        }
    }

    fn validate(&self) -> CliResult<()> {
        if !self.schema_dir.is_dir() {
            return Err(CliError::config_error(format!(
                "schema_dir '{}' is not a directory",
                self.schema_dir.display()
            )));
        }
        self.quality
            .validate()
            .map_err(|e| CliError::config_error(format!("Invalid quality config: {}", e)))?;
        Ok(())
    }
}

/// A fully loaded engine
pub struct Engine {
    pub assembler: ProfileAssembler,
    pub schemas: LoadReport,
    pub metrics: Arc<MetricsRegistry>,
}

impl Engine {
    /// Loads schemas and tables and wires the assembler.
    ///
    /// Rejected namespaces are reported in `schemas`, not fatal; unreadable
    /// tables are.
    pub fn build(config: &EngineConfig) -> CliResult<Self> {
        let metrics = Arc::new(MetricsRegistry::new());

        let registry = Arc::new(SchemaRegistry::new());
        let schemas = registry.load_dir(&config.schema_dir)?;
        metrics.add_schemas_loaded(schemas.loaded.len() as u64);
        metrics.add_schemas_rejected(schemas.rejected.len() as u64);

        let mapping = CanonicalFieldMap::load(&config.canonical_fields)?;
        let trust = TrustTable::load(&config.trust_scores)?;

        let review_queue: Arc<dyn ReviewQueue> = match &config.review_queue {
            Some(path) => Arc::new(JsonLinesReviewQueue::open(path).map_err(|e| {
                CliError::config_error(format!("Cannot open review queue '{}': {}", path.display(), e))
            })?),
            None => Arc::new(MemoryReviewQueue::new()),
        };

        let scorer = QualityScorer::new(config.quality)
            .map_err(|e| CliError::config_error(format!("Invalid quality config: {}", e)))?;

        let assembler = ProfileAssembler::new(
            registry,
            mapping,
            trust,
            Arc::new(MemoryProfileRepository::new()),
            review_queue,
        )
        .with_metrics(Arc::clone(&metrics))
        .with_scorer(scorer);

        Ok(Self {
            assembler,
            schemas,
            metrics,
        })
    }
}
