//! Specimen records and their antibiotic sets.

use std::collections::BTreeSet;
use std::collections::btree_set;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SpecimenId, TestOutcome};

/// Set of antibiotic names.
///
/// Equality and hashing follow set contents: insertion order and duplicates
/// never affect them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AntibioticSet(BTreeSet<String>);

impl AntibioticSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trimmed name. Blank names are ignored.
    ///
    /// Returns true if the name was not already present.
    pub fn insert(&mut self, name: impl AsRef<str>) -> bool {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return false;
        }
        self.0.insert(trimmed.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }

    /// Adds every name of `other`, returning how many were new.
    pub fn union_with(&mut self, other: &AntibioticSet) -> usize {
        let before = self.0.len();
        self.0.extend(other.0.iter().cloned());
        self.0.len() - before
    }

    pub fn is_superset(&self, other: &AntibioticSet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl<S: AsRef<str>> FromIterator<S> for AntibioticSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AntibioticSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The three antibiotic sets of one specimen, keyed by test outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Antibiogram {
    pub resistant: AntibioticSet,
    pub susceptible: AntibioticSet,
    pub susceptible_at_high_dose: AntibioticSet,
}

impl Antibiogram {
    pub fn set(&self, outcome: TestOutcome) -> &AntibioticSet {
        match outcome {
            TestOutcome::Resistant => &self.resistant,
            TestOutcome::Susceptible => &self.susceptible,
            TestOutcome::SusceptibleAtHighDose => &self.susceptible_at_high_dose,
        }
    }

    pub fn set_mut(&mut self, outcome: TestOutcome) -> &mut AntibioticSet {
        match outcome {
            TestOutcome::Resistant => &mut self.resistant,
            TestOutcome::Susceptible => &mut self.susceptible,
            TestOutcome::SusceptibleAtHighDose => &mut self.susceptible_at_high_dose,
        }
    }

    /// True when no antibiotic was recorded under any outcome.
    pub fn is_empty(&self) -> bool {
        self.resistant.is_empty()
            && self.susceptible.is_empty()
            && self.susceptible_at_high_dose.is_empty()
    }

    /// Unions each set of `other` into the matching set here.
    ///
    /// Returns the number of names that were added across all three sets.
    pub fn merge(&mut self, other: &Antibiogram) -> usize {
        TestOutcome::ALL
            .into_iter()
            .map(|outcome| self.set_mut(outcome).union_with(other.set(outcome)))
            .sum()
    }

    pub fn is_superset(&self, other: &Antibiogram) -> bool {
        TestOutcome::ALL
            .into_iter()
            .all(|outcome| self.set(outcome).is_superset(other.set(outcome)))
    }
}

/// Canonical per-specimen record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenRecord {
    pub specimen_id: SpecimenId,
    pub patient_name: Option<String>,
    pub department: Option<String>,
    pub organism: Option<String>,
    /// Time of the most recent upload touching this specimen.
    pub uploaded_at: DateTime<Utc>,
    /// Time the test was requested. Set once, on creation.
    pub requested_at: Option<DateTime<Utc>>,
    /// Time the specimen was collected. Set once, on creation.
    pub collected_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub antibiogram: Antibiogram,
}

impl SpecimenRecord {
    pub fn new(specimen_id: SpecimenId, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            specimen_id,
            patient_name: None,
            department: None,
            organism: None,
            uploaded_at,
            requested_at: None,
            collected_at: None,
            antibiogram: Antibiogram::default(),
        }
    }
}

/// Listing filter over stored records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Inclusive lower bound on the collection date.
    pub collected_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the collection date.
    pub collected_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the patient name.
    pub patient_name: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &SpecimenRecord) -> bool {
        if self.collected_from.is_some() || self.collected_to.is_some() {
            let Some(collected) = record.collected_at else {
                return false;
            };
            if self.collected_from.is_some_and(|from| collected < from) {
                return false;
            }
            if self.collected_to.is_some_and(|to| collected > to) {
                return false;
            }
        }
        if let Some(needle) = self.patient_name.as_deref() {
            let needle = needle.trim().to_lowercase();
            if !needle.is_empty() {
                let Some(name) = record.patient_name.as_deref() else {
                    return false;
                };
                if !name.to_lowercase().contains(&needle) {
                    return false;
                }
            }
        }
        true
    }
}

/// One page of a listing together with the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn set_equality_ignores_order_and_duplicates() {
        let a: AntibioticSet = ["Ampicillin", "Gentamicin", "Ampicillin"].into_iter().collect();
        let b: AntibioticSet = ["Gentamicin", "Ampicillin"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn blank_names_are_ignored() {
        let mut set = AntibioticSet::new();
        assert!(!set.insert("  "));
        assert!(set.insert(" Colistin "));
        assert!(set.contains("Colistin"));
    }

    #[test]
    fn merge_counts_only_new_names() {
        let mut base = Antibiogram::default();
        base.resistant.insert("Ampicillin");
        let mut incoming = Antibiogram::default();
        incoming.resistant.insert("Ampicillin");
        incoming.susceptible.insert("Gentamicin");

        assert_eq!(base.merge(&incoming), 1);
        assert!(base.is_superset(&incoming));
    }

    #[test]
    fn filter_by_date_window_excludes_undated_records() {
        let id = SpecimenId::new("B1").unwrap();
        let mut record = SpecimenRecord::new(id, at(1));
        let filter = RecordFilter {
            collected_from: Some(at(2)),
            collected_to: Some(at(4)),
            ..RecordFilter::default()
        };
        assert!(!filter.matches(&record));

        record.collected_at = Some(at(4));
        assert!(filter.matches(&record));
        record.collected_at = Some(at(5));
        assert!(!filter.matches(&record));
    }

    #[test]
    fn filter_by_patient_is_case_insensitive() {
        let id = SpecimenId::new("B1").unwrap();
        let mut record = SpecimenRecord::new(id, at(1));
        record.patient_name = Some("Ayse Yilmaz".to_string());
        let filter = RecordFilter {
            patient_name: Some("yilmaz".to_string()),
            ..RecordFilter::default()
        };
        assert!(filter.matches(&record));
    }
}
