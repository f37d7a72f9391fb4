use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;

use chrono::{TimeZone, Utc};

use abg_match::{MatchCache, MatchIndex, derive_profile};
use abg_model::{ProfileEntry, ProfileKey, SpecimenId, SpecimenRecord, TestOutcome};
use abg_store::{MemoryProfileStore, ProfileStore};

fn record(id: &str, resistant: &[&str]) -> SpecimenRecord {
    let uploaded = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let mut record = SpecimenRecord::new(SpecimenId::new(id).unwrap(), uploaded);
    for name in resistant {
        record.antibiogram.set_mut(TestOutcome::Resistant).insert(*name);
    }
    record
}

#[test]
fn concurrent_reindex_of_one_specimen_leaves_single_membership() {
    let store = Arc::new(MemoryProfileStore::new());
    let index = MatchIndex::new(store.clone(), MatchCache::new(64));

    let profiles: Vec<Vec<&str>> = vec![
        vec!["AMP"],
        vec!["AMP", "CIP"],
        vec!["GEN"],
        vec!["AMP", "GEN", "CIP"],
    ];

    thread::scope(|scope| {
        for round in 0..4 {
            let index = &index;
            let profiles = &profiles;
            scope.spawn(move || {
                for step in 0..25 {
                    let names = &profiles[(round + step) % profiles.len()];
                    index.update(&[record("B1", names)]).unwrap();
                }
            });
        }
    });

    let entries = store.entries().unwrap();
    let holding: Vec<_> = entries
        .iter()
        .filter(|entry| entry.contains(&SpecimenId::new("B1").unwrap()))
        .collect();
    assert_eq!(holding.len(), 1);
    assert_eq!(entries.len(), 1);
}

#[test]
fn concurrent_uploads_of_distinct_specimens_share_one_entry() {
    let store = Arc::new(MemoryProfileStore::new());
    let index = MatchIndex::new(store.clone(), MatchCache::new(64));

    thread::scope(|scope| {
        for n in 0..16 {
            let index = &index;
            scope.spawn(move || {
                index
                    .update(&[record(&format!("B{n}"), &["AMP", "CIP"])])
                    .unwrap();
            });
        }
    });

    let query = record("query", &["CIP", "AMP"]);
    let entry = index.lookup(&query).unwrap().unwrap();
    assert_eq!(entry.members.len(), 16);
    assert_eq!(Some(entry.key), derive_profile(&query.antibiogram));
}

/// Profile store that runs one pending index write right after answering a
/// read, between the store read and the cache fill of the lookup.
struct WriteDuringRead {
    inner: MemoryProfileStore,
    index: OnceLock<Weak<MatchIndex>>,
    pending: Mutex<Option<SpecimenRecord>>,
}

impl ProfileStore for WriteDuringRead {
    fn upsert_remove_then_add(
        &self,
        owner: &SpecimenId,
        key: &ProfileKey,
    ) -> abg_store::Result<Vec<ProfileKey>> {
        self.inner.upsert_remove_then_add(owner, key)
    }

    fn delete_owner_everywhere(&self, owner: &SpecimenId) -> abg_store::Result<Vec<ProfileKey>> {
        self.inner.delete_owner_everywhere(owner)
    }

    fn find_by_fingerprint(&self, key: &ProfileKey) -> abg_store::Result<Option<ProfileEntry>> {
        let found = self.inner.find_by_fingerprint(key)?;
        let pending = self.pending.lock().unwrap().take();
        if let Some(record) = pending {
            let index = self.index.get().and_then(Weak::upgrade).unwrap();
            index.update(&[record]).unwrap();
        }
        Ok(found)
    }
}

#[test]
fn write_during_lookup_does_not_leave_stale_cache_entry() {
    let store = Arc::new(WriteDuringRead {
        inner: MemoryProfileStore::new(),
        index: OnceLock::new(),
        pending: Mutex::new(None),
    });
    let index = Arc::new(MatchIndex::new(store.clone(), MatchCache::new(16)));
    store.index.set(Arc::downgrade(&index)).unwrap();

    let b1 = record("B1", &["AMP", "CIP"]);
    index.update(&[b1.clone(), record("B2", &["AMP", "CIP"])]).unwrap();
    *store.pending.lock().unwrap() = Some(record("B3", &["CIP", "AMP"]));

    let first = index.lookup(&b1).unwrap().unwrap();
    assert_eq!(first.members.len(), 2);
    assert!(index.cache().is_empty());

    let later = index.lookup(&b1).unwrap().unwrap();
    let members: Vec<_> = later.members.iter().map(SpecimenId::as_str).collect();
    assert_eq!(members, ["B1", "B2", "B3"]);
}
