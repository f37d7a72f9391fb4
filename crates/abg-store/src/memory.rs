//! In-process stores.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use abg_model::{Page, ProfileEntry, ProfileKey, RecordFilter, SpecimenId, SpecimenRecord};

use crate::error::{Result, StoreError};
use crate::traits::{ProfileStore, RecordStore};

/// Specimen records keyed by identifier.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<SpecimenId, SpecimenRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = SpecimenRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.specimen_id.clone(), record))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Copy of every stored record, ordered by identifier.
    pub fn records(&self) -> Result<Vec<SpecimenRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("record"))?;
        Ok(records.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("record"))?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Applies one merge-upsert to the map and returns the resulting record.
fn merge_upsert(
    records: &mut BTreeMap<SpecimenId, SpecimenRecord>,
    incoming: &SpecimenRecord,
    uploaded_at: DateTime<Utc>,
) -> SpecimenRecord {
    match records.entry(incoming.specimen_id.clone()) {
        Entry::Occupied(mut slot) => {
            let stored = slot.get_mut();
            stored.uploaded_at = uploaded_at;
            stored.antibiogram.merge(&incoming.antibiogram);
            stored.clone()
        }
        Entry::Vacant(slot) => {
            let mut created = incoming.clone();
            created.uploaded_at = uploaded_at;
            slot.insert(created).clone()
        }
    }
}

/// Newest collection date first, undated last, then by identifier.
fn listing_order(a: &SpecimenRecord, b: &SpecimenRecord) -> Ordering {
    match (a.collected_at, b.collected_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.specimen_id.cmp(&b.specimen_id))
}

impl RecordStore for MemoryRecordStore {
    fn upsert_many(
        &self,
        records: &[SpecimenRecord],
        uploaded_at: DateTime<Utc>,
    ) -> Result<Vec<SpecimenRecord>> {
        let mut merged = Vec::with_capacity(records.len());
        let mut created = 0usize;
        for record in records {
            // One lock per record: each upsert is atomic, the batch is not.
            let mut stored = self
                .records
                .write()
                .map_err(|_| StoreError::poisoned("record"))?;
            if !stored.contains_key(&record.specimen_id) {
                created += 1;
            }
            merged.push(merge_upsert(&mut stored, record, uploaded_at));
        }
        tracing::info!(
            upserted = merged.len(),
            created,
            "upserted specimen records"
        );
        Ok(merged)
    }

    fn find_by_id(&self, id: &SpecimenId) -> Result<Option<SpecimenRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("record"))?;
        Ok(records.get(id).cloned())
    }

    fn find_by_ids(&self, ids: &[SpecimenId]) -> Result<Vec<SpecimenRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("record"))?;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    fn find_page(
        &self,
        filter: &RecordFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Page<SpecimenRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::poisoned("record"))?;
        let mut matching: Vec<&SpecimenRecord> =
            records.values().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| listing_order(a, b));
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    fn delete_by_id(&self, id: &SpecimenId) -> Result<bool> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::poisoned("record"))?;
        Ok(records.remove(id).is_some())
    }

    fn delete_by_ids(&self, ids: &[SpecimenId]) -> Result<usize> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::poisoned("record"))?;
        Ok(ids.iter().filter(|id| records.remove(*id).is_some()).count())
    }
}

/// Profile entries keyed by fingerprint triple.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    entries: RwLock<BTreeMap<ProfileKey, ProfileEntry>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ProfileEntry>) -> Self {
        let mut by_key: BTreeMap<ProfileKey, ProfileEntry> = BTreeMap::new();
        for entry in entries {
            match by_key.entry(entry.key.clone()) {
                Entry::Occupied(mut slot) => slot.get_mut().members.extend(entry.members),
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }
        Self {
            entries: RwLock::new(by_key),
        }
    }

    /// Copy of every entry, including single-member ones.
    pub fn entries(&self) -> Result<Vec<ProfileEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::poisoned("profile"))?;
        Ok(entries.values().cloned().collect())
    }

    /// Entry for `key` regardless of member count.
    pub fn find_entry(&self, key: &ProfileKey) -> Result<Option<ProfileEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::poisoned("profile"))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<ProfileKey, ProfileEntry>>> {
        self.entries
            .write()
            .map_err(|_| StoreError::poisoned("profile"))
    }
}

/// Removes `owner` from every entry and drops entries left empty.
fn remove_owner(
    entries: &mut BTreeMap<ProfileKey, ProfileEntry>,
    owner: &SpecimenId,
) -> Vec<ProfileKey> {
    let mut affected = Vec::new();
    for (key, entry) in entries.iter_mut() {
        if entry.members.remove(owner) {
            affected.push(key.clone());
        }
    }
    entries.retain(|_, entry| !entry.members.is_empty());
    affected
}

impl ProfileStore for MemoryProfileStore {
    /// Both steps run under one write guard, so readers never observe
    /// `owner` outside every entry.
    fn upsert_remove_then_add(
        &self,
        owner: &SpecimenId,
        key: &ProfileKey,
    ) -> Result<Vec<ProfileKey>> {
        let mut entries = self.write()?;
        let evicted = remove_owner(&mut entries, owner);
        entries
            .entry(key.clone())
            .or_insert_with(|| ProfileEntry::new(key.clone()))
            .members
            .insert(owner.clone());
        Ok(evicted)
    }

    fn delete_owner_everywhere(&self, owner: &SpecimenId) -> Result<Vec<ProfileKey>> {
        let mut entries = self.write()?;
        Ok(remove_owner(&mut entries, owner))
    }

    fn find_by_fingerprint(&self, key: &ProfileKey) -> Result<Option<ProfileEntry>> {
        Ok(self.find_entry(key)?.filter(ProfileEntry::is_match))
    }
}

#[cfg(test)]
mod tests {
    use abg_model::{Fingerprint, TestOutcome};
    use chrono::TimeZone;

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 5, hour, 0, 0).unwrap()
    }

    fn id(value: &str) -> SpecimenId {
        SpecimenId::new(value).unwrap()
    }

    fn key(tag: &str) -> ProfileKey {
        ProfileKey {
            resistant: Fingerprint::new(tag).unwrap(),
            susceptible: Fingerprint::new(tag).unwrap(),
            susceptible_at_high_dose: Fingerprint::new(tag).unwrap(),
        }
    }

    fn record(specimen: &str, resistant: &[&str]) -> SpecimenRecord {
        let mut record = SpecimenRecord::new(id(specimen), at(0));
        for name in resistant {
            record
                .antibiogram
                .set_mut(TestOutcome::Resistant)
                .insert(name);
        }
        record
    }

    #[test]
    fn upsert_unions_sets_and_keeps_first_descriptive_fields() {
        let store = MemoryRecordStore::new();
        let mut first = record("B1", &["Ampicillin"]);
        first.patient_name = Some("First".to_string());
        first.collected_at = Some(at(1));
        store.upsert_many(&[first], at(8)).unwrap();

        let mut second = record("B1", &["Gentamicin"]);
        second.patient_name = Some("Second".to_string());
        second.collected_at = Some(at(2));
        let merged = store.upsert_many(&[second], at(9)).unwrap();

        let stored = &merged[0];
        assert_eq!(stored.patient_name.as_deref(), Some("First"));
        assert_eq!(stored.collected_at, Some(at(1)));
        assert_eq!(stored.uploaded_at, at(9));
        assert!(stored.antibiogram.resistant.contains("Ampicillin"));
        assert!(stored.antibiogram.resistant.contains("Gentamicin"));
        assert_eq!(store.find_by_id(&id("B1")).unwrap().as_ref(), Some(stored));
    }

    #[test]
    fn page_sorts_newest_first_with_undated_last() {
        let mut a = record("A", &[]);
        a.collected_at = Some(at(1));
        let mut b = record("B", &[]);
        b.collected_at = Some(at(3));
        let c = record("C", &[]);
        let store = MemoryRecordStore::from_records([a, b, c]);

        let page = store.find_page(&RecordFilter::default(), 2, 0).unwrap();
        assert_eq!(page.total, 3);
        let ids: Vec<_> = page.items.iter().map(|r| r.specimen_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);

        let rest = store.find_page(&RecordFilter::default(), 2, 2).unwrap();
        assert_eq!(rest.items.len(), 1);
        assert_eq!(rest.items[0].specimen_id.as_str(), "C");
    }

    #[test]
    fn batch_lookup_and_delete_skip_unknown_ids() {
        let store = MemoryRecordStore::from_records([record("A", &[]), record("B", &[])]);
        let found = store.find_by_ids(&[id("B"), id("Z"), id("A")]).unwrap();
        let ids: Vec<_> = found.iter().map(|r| r.specimen_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);

        assert_eq!(store.delete_by_ids(&[id("A"), id("Z")]).unwrap(), 1);
        assert!(!store.delete_by_id(&id("A")).unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn specimen_moves_between_entries() {
        let store = MemoryProfileStore::new();
        assert!(store.upsert_remove_then_add(&id("B1"), &key("aa")).unwrap().is_empty());
        store.upsert_remove_then_add(&id("B2"), &key("aa")).unwrap();

        let evicted = store.upsert_remove_then_add(&id("B1"), &key("bb")).unwrap();
        assert_eq!(evicted, vec![key("aa")]);

        let old = store.find_entry(&key("aa")).unwrap().unwrap();
        assert!(!old.contains(&id("B1")));
        let new = store.find_entry(&key("bb")).unwrap().unwrap();
        assert!(new.contains(&id("B1")));
        let memberships = store
            .entries()
            .unwrap()
            .iter()
            .filter(|e| e.contains(&id("B1")))
            .count();
        assert_eq!(memberships, 1);
    }

    #[test]
    fn readers_always_see_a_moving_specimen_in_one_entry() {
        let store = MemoryProfileStore::new();
        store.upsert_remove_then_add(&id("B2"), &key("aa")).unwrap();
        store.upsert_remove_then_add(&id("B3"), &key("bb")).unwrap();
        store.upsert_remove_then_add(&id("B1"), &key("aa")).unwrap();
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for step in 0..2000 {
                    let target = if step % 2 == 0 { key("bb") } else { key("aa") };
                    store.upsert_remove_then_add(&id("B1"), &target).unwrap();
                }
                done.store(true, std::sync::atomic::Ordering::Release);
            });
            while !done.load(std::sync::atomic::Ordering::Acquire) {
                let holding = store
                    .entries()
                    .unwrap()
                    .iter()
                    .filter(|e| e.contains(&id("B1")))
                    .count();
                assert_eq!(holding, 1);
            }
        });
    }

    #[test]
    fn singleton_entries_are_not_returned_and_empty_ones_are_dropped() {
        let store = MemoryProfileStore::new();
        store.upsert_remove_then_add(&id("B1"), &key("aa")).unwrap();
        assert!(store.find_by_fingerprint(&key("aa")).unwrap().is_none());
        assert!(store.find_entry(&key("aa")).unwrap().is_some());

        assert_eq!(
            store.delete_owner_everywhere(&id("B1")).unwrap(),
            vec![key("aa")]
        );
        assert!(store.entries().unwrap().is_empty());
    }
}
