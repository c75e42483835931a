use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

use super::record::ProfileExtensions;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("profile storage failed: {0}")]
    Storage(String),
}

/// Persistence for per-profile extensions, keyed by profile id.
///
/// The assembler serializes access per profile, so implementations only
/// need to be safe across different profiles.
pub trait ProfileRepository: Send + Sync {
    fn load(&self, profile_id: &str) -> Result<Option<ProfileExtensions>, RepositoryError>;

    fn save(&self, profile_id: &str, profile: &ProfileExtensions) -> Result<(), RepositoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryProfileRepository {
    profiles: RwLock<HashMap<String, ProfileExtensions>>,
}

impl MemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted ids of every stored profile
    pub fn profile_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.profiles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProfileRepository for MemoryProfileRepository {
    fn load(&self, profile_id: &str) -> Result<Option<ProfileExtensions>, RepositoryError> {
        Ok(self
            .profiles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(profile_id)
            .cloned())
    }

    fn save(&self, profile_id: &str, profile: &ProfileExtensions) -> Result<(), RepositoryError> {
        self.profiles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(profile_id.to_string(), profile.clone());
        Ok(())
    }
}
