//! The shared-profile match index.

use std::collections::BTreeSet;
use std::sync::Arc;

use abg_model::{ProfileEntry, ProfileKey, SpecimenId, SpecimenRecord};
use abg_store::{ProfileStore, Result};

use crate::cache::MatchCache;
use crate::hasher::derive_profile;
use crate::locks::KeyedLocks;

/// Outcome of one [`MatchIndex::update`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexUpdate {
    /// Records placed into a profile entry.
    pub indexed: usize,
    /// Records with no classified antibiotics, left out of the index.
    pub skipped: usize,
    /// Profiles whose membership changed.
    pub touched: BTreeSet<ProfileKey>,
}

/// Keeps every indexed specimen in exactly one profile entry.
///
/// Writes for one specimen are serialised by a per-specimen lock, so the
/// remove-then-add pair is never interleaved with another write for the same
/// specimen. Cached entries for every touched profile are dropped once the
/// store write has finished.
pub struct MatchIndex {
    store: Arc<dyn ProfileStore>,
    cache: MatchCache,
    locks: KeyedLocks,
}

impl MatchIndex {
    pub fn new(store: Arc<dyn ProfileStore>, cache: MatchCache) -> Self {
        Self {
            store,
            cache,
            locks: KeyedLocks::new(),
        }
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    /// Re-indexes each record under the profile of its current antibiogram.
    ///
    /// Pass the records as stored after merging, so the profile reflects
    /// everything known about the specimen.
    pub fn update(&self, records: &[SpecimenRecord]) -> Result<IndexUpdate> {
        let mut update = IndexUpdate::default();
        for record in records {
            let Some(key) = derive_profile(&record.antibiogram) else {
                tracing::debug!(specimen = %record.specimen_id, "no classified antibiotics, not indexed");
                update.skipped += 1;
                continue;
            };
            let touched = self.reindex(&record.specimen_id, key)?;
            update.indexed += 1;
            update.touched.extend(touched);
        }
        tracing::debug!(
            indexed = update.indexed,
            skipped = update.skipped,
            touched = update.touched.len(),
            "match index updated"
        );
        Ok(update)
    }

    fn reindex(&self, owner: &SpecimenId, key: ProfileKey) -> Result<Vec<ProfileKey>> {
        self.locks.with_lock(owner, || {
            let mut touched = self.store.upsert_remove_then_add(owner, &key)?;
            touched.push(key);
            self.invalidate_all(&touched);
            Ok(touched)
        })
    }

    /// Removes one specimen from the index. Returns the profiles it left.
    pub fn remove(&self, owner: &SpecimenId) -> Result<Vec<ProfileKey>> {
        self.locks.with_lock(owner, || {
            let touched = self.store.delete_owner_everywhere(owner)?;
            self.invalidate_all(&touched);
            Ok(touched)
        })
    }

    pub fn remove_many(&self, owners: &[SpecimenId]) -> Result<BTreeSet<ProfileKey>> {
        let mut touched = BTreeSet::new();
        for owner in owners {
            touched.extend(self.remove(owner)?);
        }
        Ok(touched)
    }

    /// The match for `record`'s current profile, if another specimen shares it.
    pub fn lookup(&self, record: &SpecimenRecord) -> Result<Option<ProfileEntry>> {
        match derive_profile(&record.antibiogram) {
            Some(key) => self.lookup_key(&key),
            None => Ok(None),
        }
    }

    /// Read-through lookup. Only entries with two or more members are cached.
    ///
    /// The fill is dropped if any profile was invalidated while the store was
    /// being read.
    pub fn lookup_key(&self, key: &ProfileKey) -> Result<Option<ProfileEntry>> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(Some(hit));
        }
        let generation = self.cache.generation();
        let found = self
            .store
            .find_by_fingerprint(key)?
            .filter(ProfileEntry::is_match);
        if let Some(entry) = &found
            && !self.cache.insert_if_current(entry.clone(), generation)
        {
            tracing::trace!(profile = %key, "profile changed during lookup, not cached");
        }
        Ok(found)
    }

    fn invalidate_all(&self, keys: &[ProfileKey]) {
        for key in keys {
            self.cache.invalidate(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use abg_model::{SpecimenRecord, TestOutcome};
    use abg_store::MemoryProfileStore;

    use super::*;

    fn record(id: &str, resistant: &[&str]) -> SpecimenRecord {
        let uploaded = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut record = SpecimenRecord::new(SpecimenId::new(id).unwrap(), uploaded);
        for name in resistant {
            record.antibiogram.set_mut(TestOutcome::Resistant).insert(*name);
        }
        record
    }

    fn index() -> (Arc<MemoryProfileStore>, MatchIndex) {
        let store = Arc::new(MemoryProfileStore::new());
        let index = MatchIndex::new(store.clone(), MatchCache::new(16));
        (store, index)
    }

    #[test]
    fn single_specimen_is_not_a_match() {
        let (_, index) = index();
        let b1 = record("B1", &["AMP"]);
        index.update(std::slice::from_ref(&b1)).unwrap();
        assert_eq!(index.lookup(&b1).unwrap(), None);
        assert!(index.cache().is_empty());
    }

    #[test]
    fn second_specimen_creates_match_and_caches_it() {
        let (_, index) = index();
        let b1 = record("B1", &["AMP"]);
        let b2 = record("B2", &["AMP"]);
        index.update(&[b1.clone(), b2]).unwrap();

        let entry = index.lookup(&b1).unwrap().unwrap();
        let members: Vec<_> = entry.members.iter().map(SpecimenId::as_str).collect();
        assert_eq!(members, ["B1", "B2"]);
        assert_eq!(index.cache().len(), 1);
    }

    #[test]
    fn moving_profile_invalidates_old_entry() {
        let (store, index) = index();
        let b1 = record("B1", &["AMP"]);
        let b2 = record("B2", &["AMP"]);
        let b3 = record("B3", &["AMP"]);
        index.update(&[b1.clone(), b2, b3]).unwrap();
        assert_eq!(index.lookup(&b1).unwrap().unwrap().members.len(), 3);

        let b3_grown = record("B3", &["AMP", "CIP"]);
        let update = index.update(std::slice::from_ref(&b3_grown)).unwrap();
        assert_eq!(update.touched.len(), 2);

        assert_eq!(index.lookup(&b1).unwrap().unwrap().members.len(), 2);
        assert_eq!(index.lookup(&b3_grown).unwrap(), None);
        let old_key = derive_profile(&b1.antibiogram).unwrap();
        assert!(!store.find_entry(&old_key).unwrap().unwrap().contains(&b3_grown.specimen_id));
    }

    #[test]
    fn empty_antibiogram_is_skipped() {
        let (store, index) = index();
        let update = index.update(&[record("B1", &[])]).unwrap();
        assert_eq!(update.indexed, 0);
        assert_eq!(update.skipped, 1);
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn remove_drops_membership_and_cache() {
        let (_, index) = index();
        let b1 = record("B1", &["AMP"]);
        let b2 = record("B2", &["AMP"]);
        index.update(&[b1.clone(), b2.clone()]).unwrap();
        assert!(index.lookup(&b1).unwrap().is_some());

        let left = index.remove(&b2.specimen_id).unwrap();
        assert_eq!(left.len(), 1);
        assert!(index.cache().is_empty());
        assert_eq!(index.lookup(&b1).unwrap(), None);
    }
}
