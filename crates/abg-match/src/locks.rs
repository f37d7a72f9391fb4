//! Per-specimen mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use abg_model::SpecimenId;

type Slots = HashMap<SpecimenId, Arc<Mutex<()>>>;

/// Lock table keyed by specimen identifier.
///
/// Work for the same specimen runs one at a time; different specimens never
/// wait on each other. Slots are dropped once no caller holds them.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<Slots>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` while holding the lock for `key`.
    pub fn with_lock<R>(&self, key: &SpecimenId, f: impl FnOnce() -> R) -> R {
        let slot = Arc::clone(self.slots().entry(key.clone()).or_default());

        let result = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut slots = self.slots();
        // Only the table and this caller still reference the slot.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        result
    }

    /// Number of specimens with a lock currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots().len()
    }
}
