//! Order-independent fingerprints of antibiotic sets.

use sha2::{Digest, Sha256};

use abg_model::{AntibioticSet, Antibiogram, Fingerprint, ProfileKey};

/// SHA-256 over the set's names in sorted order, each length-prefixed so
/// that no two distinct sets share an encoding.
pub fn fingerprint(set: &AntibioticSet) -> Fingerprint {
    let mut hasher = Sha256::new();
    for name in set {
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
    }
    Fingerprint::from_digest(hasher.finalize())
}

/// Profile key of an antibiogram, or `None` when all three sets are empty.
pub fn derive_profile(antibiogram: &Antibiogram) -> Option<ProfileKey> {
    if antibiogram.is_empty() {
        return None;
    }
    Some(ProfileKey {
        resistant: fingerprint(&antibiogram.resistant),
        susceptible: fingerprint(&antibiogram.susceptible),
        susceptible_at_high_dose: fingerprint(&antibiogram.susceptible_at_high_dose),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_set_hashes_to_empty_digest() {
        assert_eq!(
            fingerprint(&AntibioticSet::new()).as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn concatenation_does_not_collide() {
        let split: AntibioticSet = ["ab", "c"].into_iter().collect();
        let joined: AntibioticSet = ["a", "bc"].into_iter().collect();
        assert_ne!(fingerprint(&split), fingerprint(&joined));
    }

    #[test]
    fn empty_antibiogram_has_no_profile() {
        assert!(derive_profile(&Antibiogram::default()).is_none());
    }

    #[test]
    fn outcome_placement_changes_profile() {
        let mut resistant = Antibiogram::default();
        resistant.resistant.insert("Ampicillin");
        let mut susceptible = Antibiogram::default();
        susceptible.susceptible.insert("Ampicillin");
        assert_ne!(derive_profile(&resistant), derive_profile(&susceptible));
    }

    proptest! {
        #[test]
        fn fingerprint_ignores_order(names in prop::collection::vec("[A-Za-z]{1,12}", 0..12)) {
            let forward: AntibioticSet = names.iter().collect();
            let backward: AntibioticSet = names.iter().rev().collect();
            let doubled: AntibioticSet = names.iter().chain(names.iter()).collect();
            prop_assert_eq!(fingerprint(&forward), fingerprint(&backward));
            prop_assert_eq!(fingerprint(&forward), fingerprint(&doubled));
        }

        #[test]
        fn distinct_sets_get_distinct_fingerprints(
            a in prop::collection::btree_set("[A-Za-z]{1,12}", 1..8),
            b in prop::collection::btree_set("[A-Za-z]{1,12}", 1..8),
        ) {
            prop_assume!(a != b);
            let a: AntibioticSet = a.iter().collect();
            let b: AntibioticSet = b.iter().collect();
            prop_assert_ne!(fingerprint(&a), fingerprint(&b));
        }
    }
}
