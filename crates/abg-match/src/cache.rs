//! Bounded cache in front of the profile store.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use abg_model::{ProfileEntry, ProfileKey};

pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Least-recently-used cache of profile entries keyed by
/// [`ProfileKey::cache_key`]. Safe to share between threads.
///
/// Every invalidation bumps a generation counter. A read-through fill taken
/// before an invalidation is refused by [`MatchCache::insert_if_current`], so
/// a value read from the store before a concurrent write never outlives it.
#[derive(Debug)]
pub struct MatchCache {
    state: Mutex<CacheState>,
}

#[derive(Debug)]
struct CacheState {
    entries: LruCache<String, ProfileEntry>,
    generation: u64,
}

impl Default for MatchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl MatchCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // Every operation leaves the LRU consistent, so a poisoned lock is safe to reuse.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &ProfileKey) -> Option<ProfileEntry> {
        self.state().entries.get(&key.cache_key()).cloned()
    }

    pub fn insert(&self, entry: ProfileEntry) {
        let cache_key = entry.key.cache_key();
        self.state().entries.put(cache_key, entry);
    }

    /// Current invalidation generation. Read it before going to the store.
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// Inserts `entry` only if nothing was invalidated since `generation` was
    /// read. Returns true if the entry was cached.
    pub fn insert_if_current(&self, entry: ProfileEntry, generation: u64) -> bool {
        let mut state = self.state();
        if state.generation != generation {
            return false;
        }
        let cache_key = entry.key.cache_key();
        state.entries.put(cache_key, entry);
        true
    }

    /// Drops the entry for `key`. Returns true if one was cached.
    pub fn invalidate(&self, key: &ProfileKey) -> bool {
        let mut state = self.state();
        state.generation = state.generation.wrapping_add(1);
        state.entries.pop(&key.cache_key()).is_some()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.state().entries.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use abg_model::Fingerprint;

    use super::*;

    fn entry(tag: &str) -> ProfileEntry {
        ProfileEntry::new(ProfileKey {
            resistant: Fingerprint::new(tag).unwrap(),
            susceptible: Fingerprint::new(tag).unwrap(),
            susceptible_at_high_dose: Fingerprint::new(tag).unwrap(),
        })
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = MatchCache::new(2);
        cache.insert(entry("a"));
        cache.insert(entry("b"));
        assert!(cache.get(&entry("a").key).is_some());
        cache.insert(entry("c"));

        assert!(cache.get(&entry("b").key).is_none());
        assert!(cache.get(&entry("a").key).is_some());
        assert!(cache.get(&entry("c").key).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_removes_only_that_key() {
        let cache = MatchCache::default();
        cache.insert(entry("a"));
        cache.insert(entry("b"));
        assert!(cache.invalidate(&entry("a").key));
        assert!(!cache.invalidate(&entry("a").key));
        assert!(cache.get(&entry("b").key).is_some());
    }

    #[test]
    fn fill_read_before_invalidation_is_refused() {
        let cache = MatchCache::default();
        let before = cache.generation();
        cache.invalidate(&entry("a").key);

        assert!(!cache.insert_if_current(entry("a"), before));
        assert!(cache.get(&entry("a").key).is_none());

        let now = cache.generation();
        assert!(cache.insert_if_current(entry("a"), now));
        assert!(cache.get(&entry("a").key).is_some());
    }

    #[test]
    fn zero_capacity_is_raised() {
        assert_eq!(MatchCache::new(0).capacity(), 1);
        assert_eq!(MatchCache::default().capacity(), DEFAULT_CACHE_CAPACITY);
    }
}
