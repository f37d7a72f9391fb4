use abg_model::{Fingerprint, ProfileKey, SpecimenId, SpecimenRecord, TestOutcome};
use abg_store::{
    MemoryProfileStore, MemoryRecordStore, ProfileStore, RecordStore, StoreError, StoreSnapshot,
    load_snapshot, save_snapshot,
};
use chrono::{TimeZone, Utc};
use tempfile::tempdir;

fn key(tag: &str) -> ProfileKey {
    ProfileKey {
        resistant: Fingerprint::new(tag).unwrap(),
        susceptible: Fingerprint::new("0").unwrap(),
        susceptible_at_high_dose: Fingerprint::new("0").unwrap(),
    }
}

#[test]
fn snapshot_restores_both_stores() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("store.json");
    let uploaded = Utc.with_ymd_and_hms(2024, 7, 5, 10, 32, 0).unwrap();

    let records = MemoryRecordStore::new();
    let mut record = SpecimenRecord::new(SpecimenId::new("B1").unwrap(), uploaded);
    record
        .antibiogram
        .set_mut(TestOutcome::Susceptible)
        .insert("Gentamicin");
    records.upsert_many(&[record], uploaded).unwrap();

    let profiles = MemoryProfileStore::new();
    for owner in ["B1", "B2"] {
        profiles
            .upsert_remove_then_add(&SpecimenId::new(owner).unwrap(), &key("ab"))
            .unwrap();
    }

    let snapshot = StoreSnapshot::capture(&records, &profiles).unwrap();
    save_snapshot(&snapshot, &path).unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let (records, profiles) = load_snapshot(&path).unwrap().unwrap().restore();
    let restored = records
        .find_by_id(&SpecimenId::new("B1").unwrap())
        .unwrap()
        .unwrap();
    assert!(restored.antibiogram.susceptible.contains("Gentamicin"));
    let entry = profiles.find_by_fingerprint(&key("ab")).unwrap().unwrap();
    assert_eq!(entry.members.len(), 2);
}

#[test]
fn missing_snapshot_is_not_an_error() {
    let dir = tempdir().unwrap();
    assert!(load_snapshot(&dir.path().join("absent.json")).unwrap().is_none());
}

#[test]
fn newer_snapshot_version_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, r#"{"version": 99, "records": [], "profiles": []}"#).unwrap();
    let err = load_snapshot(&path).unwrap_err();
    assert!(matches!(
        err,
        StoreError::UnsupportedVersion { found: 99, .. }
    ));
}
