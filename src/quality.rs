//! Profile data-quality score
//!
//! A 0-100 weighted score over four components, each itself 0-100:
//!
//! - completeness: share of stored extension values that carry data
//! - coverage: share of required schema fields present, averaged over the
//!   namespaces the profile has data for
//! - freshness: linear decay from the newest write to zero at `max_age_days`
//! - ownership: share of canonical fields in the resolved state
//!
//! Score bands: 90+ excellent, 70+ good, 50+ fair, below 50 poor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profile::ProfileExtensions;
use crate::schema::SchemaMap;

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QualityConfigError {
    #[error("quality weights must be finite and non-negative")]
    InvalidWeight,
    #[error("quality weights must sum to 1.0, got {0}")]
    WeightSum(f64),
    #[error("max_age_days must be greater than zero")]
    ZeroMaxAge,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub completeness: f64,
    pub coverage: f64,
    pub freshness: f64,
    pub ownership: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            completeness: 0.3,
            coverage: 0.3,
            freshness: 0.2,
            ownership: 0.2,
        }
    }
}

impl QualityWeights {
    pub fn validate(&self) -> Result<(), QualityConfigError> {
        let all = [self.completeness, self.coverage, self.freshness, self.ownership];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(QualityConfigError::InvalidWeight);
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(QualityConfigError::WeightSum(sum));
        }
        Ok(())
    }
}

/// Scorer settings, as found under `quality` in the engine config
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub weights: QualityWeights,
    pub max_age_days: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            max_age_days: 30,
        }
    }
}

impl QualityConfig {
    pub fn validate(&self) -> Result<(), QualityConfigError> {
        self.weights.validate()?;
        if self.max_age_days == 0 {
            return Err(QualityConfigError::ZeroMaxAge);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Component {
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityBreakdown {
    pub completeness: Component,
    pub coverage: Component,
    pub freshness: Component,
    pub ownership: Component,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityScore {
    pub score: f64,
    pub grade: QualityGrade,
    pub breakdown: QualityBreakdown,
}

#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    pub fn new(config: QualityConfig) -> Result<Self, QualityConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    pub fn score(&self, profile: &ProfileExtensions, schemas: &SchemaMap, now: DateTime<Utc>) -> QualityScore {
        let weights = self.config.weights;
        let breakdown = QualityBreakdown {
            completeness: Component {
                score: completeness(profile),
                weight: weights.completeness,
            },
            coverage: Component {
                score: coverage(profile, schemas),
                weight: weights.coverage,
            },
            freshness: Component {
                score: freshness(profile, now, self.config.max_age_days),
                weight: weights.freshness,
            },
            ownership: Component {
                score: ownership(profile),
                weight: weights.ownership,
            },
        };

        let total: f64 = [
            breakdown.completeness,
            breakdown.coverage,
            breakdown.freshness,
            breakdown.ownership,
        ]
        .iter()
        .map(|c| c.score * c.weight)
        .sum();
        let score = total.clamp(0.0, 100.0);

        QualityScore {
            score,
            grade: grade(score),
            breakdown,
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn completeness(profile: &ProfileExtensions) -> f64 {
    let bag = &profile.extensions;
    let filled = bag.values().filter(|(_, _, v)| v.is_filled()).count();
    percent(filled, bag.len())
}

fn coverage(profile: &ProfileExtensions, schemas: &SchemaMap) -> f64 {
    let bag = &profile.extensions;
    let mut ratios = Vec::new();
    for namespace in bag.namespaces() {
        let Some(schema) = schemas.get(namespace) else {
            continue;
        };
        let required = schema.required_fields();
        if required.is_empty() {
            ratios.push(100.0);
            continue;
        }
        let present = required
            .iter()
            .filter(|name| bag.get(namespace, name).map_or(false, |v| !v.value.is_null()))
            .count();
        ratios.push(percent(present, required.len()));
    }
    if ratios.is_empty() {
        0.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    }
}

fn freshness(profile: &ProfileExtensions, now: DateTime<Utc>, max_age_days: u32) -> f64 {
    let newest = profile.extensions.values().map(|(_, _, v)| v.updated_at).max();
    let Some(newest) = newest else {
        return 0.0;
    };
    let age_days = (now - newest).num_days().max(0) as f64;
    let max = f64::from(max_age_days);
    if age_days >= max {
        0.0
    } else {
        (1.0 - age_days / max) * 100.0
    }
}

fn ownership(profile: &ProfileExtensions) -> f64 {
    let resolved = profile.canonical.values().filter(|s| s.is_resolved()).count();
    percent(resolved, profile.canonical.len())
}

fn grade(score: f64) -> QualityGrade {
    if score >= 90.0 {
        QualityGrade::Excellent
    } else if score >= 70.0 {
        QualityGrade::Good
    } else if score >= 50.0 {
        QualityGrade::Fair
    } else {
        QualityGrade::Poor
    }
}
