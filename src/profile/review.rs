//! Reviewer queue
//!
//! Receives everything the engine will not decide on its own: canonical
//! fields whose most trusted sources disagree, and fields no schema defines.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::trust::Candidate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReviewItem {
    /// Top-trust candidates assert different values
    Conflict {
        id: Uuid,
        profile_id: String,
        canonical_field: String,
        candidates: Vec<Candidate>,
        raised_at: DateTime<Utc>,
    },
    /// A payload field without a schema definition
    UnschemadField {
        id: Uuid,
        profile_id: String,
        namespace: String,
        field: String,
        value: Value,
        seen_at: DateTime<Utc>,
    },
}

impl ReviewItem {
    pub fn conflict(profile_id: &str, canonical_field: &str, candidates: Vec<Candidate>, raised_at: DateTime<Utc>) -> Self {
        ReviewItem::Conflict {
            id: Uuid::new_v4(),
            profile_id: profile_id.to_string(),
            canonical_field: canonical_field.to_string(),
            candidates,
            raised_at,
        }
    }

    pub fn unschemad_field(profile_id: &str, namespace: &str, field: &str, value: Value, seen_at: DateTime<Utc>) -> Self {
        ReviewItem::UnschemadField {
            id: Uuid::new_v4(),
            profile_id: profile_id.to_string(),
            namespace: namespace.to_string(),
            field: field.to_string(),
            value,
            seen_at,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ReviewItem::Conflict { id, .. } | ReviewItem::UnschemadField { id, .. } => *id,
        }
    }

    pub fn profile_id(&self) -> &str {
        match self {
            ReviewItem::Conflict { profile_id, .. } | ReviewItem::UnschemadField { profile_id, .. } => profile_id,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("review queue I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("cannot encode review item: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait ReviewQueue: Send + Sync {
    fn submit(&self, item: ReviewItem) -> Result<(), ReviewError>;
}

/// Keeps submitted items in memory, in submission order.
#[derive(Debug, Default)]
pub struct MemoryReviewQueue {
    items: Mutex<Vec<ReviewItem>>,
}

impl MemoryReviewQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> Vec<ReviewItem> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Removes and returns everything queued so far
    pub fn drain(&self) -> Vec<ReviewItem> {
        std::mem::take(&mut *self.items.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReviewQueue for MemoryReviewQueue {
    fn submit(&self, item: ReviewItem) -> Result<(), ReviewError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(item);
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug)]
pub struct JsonLinesReviewQueue {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesReviewQueue {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self, ReviewError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReviewQueue for JsonLinesReviewQueue {
    fn submit(&self, item: ReviewItem) -> Result<(), ReviewError> {
        let mut line = serde_json::to_vec(&item)?;
        line.push(b'\n');
        // one write per item so lines never interleave
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}
