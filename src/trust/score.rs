use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::InvalidTrustScore;

/// Configured authority of a namespace for a field.
///
/// Always finite and non-negative, so scores are totally ordered. Values are
/// usually in `0.0..=1.0`, but integer tiers (`1`, `2`, `3`) work the same way.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TrustScore(f64);

impl TrustScore {
    pub const ZERO: TrustScore = TrustScore(0.0);

    pub fn new(value: f64) -> Result<Self, InvalidTrustScore> {
        if !value.is_finite() || value < 0.0 {
            return Err(InvalidTrustScore(value));
        }
        // fold -0.0 into 0.0 so Eq and Ord agree
        Ok(TrustScore(value + 0.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for TrustScore {
    type Error = InvalidTrustScore;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        TrustScore::new(value)
    }
}

impl From<TrustScore> for f64 {
    fn from(score: TrustScore) -> f64 {
        score.0
    }
}

impl PartialEq for TrustScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TrustScore {}

impl PartialOrd for TrustScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TrustScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
