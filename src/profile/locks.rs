use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// One mutex per profile id, created on first use.
///
/// Holding a profile's mutex serializes load, merge, resolve and save for
/// that profile only; other profiles proceed in parallel. An entry lives
/// only while some caller holds its `Arc`, so the map is bounded by the
/// number of profiles in flight.
#[derive(Debug, Default)]
pub struct ProfileLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProfileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, profile_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self
            .locks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(profile_id)
        {
            return Arc::clone(lock);
        }
        let mut locks = self.locks.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(profile_id.to_string()).or_default())
    }

    /// Drops the entry for `profile_id` once no caller holds it. Callers drop
    /// their own `Arc` first.
    pub fn release(&self, profile_id: &str) {
        let mut locks = self.locks.write().unwrap_or_else(PoisonError::into_inner);
        if locks.get(profile_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(profile_id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
