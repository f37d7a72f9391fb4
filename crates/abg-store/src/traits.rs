//! Storage contracts.

use chrono::{DateTime, Utc};

use abg_model::{Page, ProfileEntry, ProfileKey, RecordFilter, SpecimenId, SpecimenRecord};

use crate::error::Result;

/// Source of truth for specimen records.
pub trait RecordStore: Send + Sync {
    /// Merge-upserts each record and returns the stored state after the merge.
    ///
    /// Per record, as one atomic step: `uploaded_at` is overwritten, the
    /// antibiotic sets are unioned into what is stored, and descriptive fields
    /// and business dates are written only when the record is created.
    fn upsert_many(
        &self,
        records: &[SpecimenRecord],
        uploaded_at: DateTime<Utc>,
    ) -> Result<Vec<SpecimenRecord>>;

    fn find_by_id(&self, id: &SpecimenId) -> Result<Option<SpecimenRecord>>;

    /// Records for the given ids in request order; unknown ids are skipped.
    fn find_by_ids(&self, ids: &[SpecimenId]) -> Result<Vec<SpecimenRecord>>;

    /// Filtered page sorted by collection date, newest first. Undated records
    /// sort last.
    fn find_page(
        &self,
        filter: &RecordFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Page<SpecimenRecord>>;

    /// Returns true if a record was removed.
    fn delete_by_id(&self, id: &SpecimenId) -> Result<bool>;

    /// Returns the number of records removed.
    fn delete_by_ids(&self, ids: &[SpecimenId]) -> Result<usize>;
}

/// Secondary index of specimens sharing an identical profile.
///
/// Implementations keep exactly one entry per [`ProfileKey`].
pub trait ProfileStore: Send + Sync {
    /// Removes `owner` from whichever entries contain it, then adds it to the
    /// entry for `key`, creating that entry if needed.
    ///
    /// Implementations that can should apply both steps atomically so readers
    /// never see `owner` in no entry. Callers still serialise concurrent calls
    /// for the same owner, which keeps stores that write the steps separately
    /// at exactly one membership. Returns the keys `owner` was removed from.
    fn upsert_remove_then_add(&self, owner: &SpecimenId, key: &ProfileKey)
    -> Result<Vec<ProfileKey>>;

    /// Removes `owner` from every entry, returning the affected keys.
    fn delete_owner_everywhere(&self, owner: &SpecimenId) -> Result<Vec<ProfileKey>>;

    /// Entry for `key` if at least two specimens share it.
    fn find_by_fingerprint(&self, key: &ProfileKey) -> Result<Option<ProfileEntry>>;
}
