//! Profile fingerprints and the entries of the match index.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ModelError, SpecimenId};

/// Order-independent digest of one antibiotic set, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let valid = !value.is_empty()
            && value
                .chars()
                .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch));
        if !valid {
            return Err(ModelError::InvalidFingerprint(value));
        }
        Ok(Self(value))
    }

    /// Hex rendering of a raw digest.
    pub fn from_digest(digest: impl AsRef<[u8]>) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

/// Fingerprint triple identifying one antibiotic profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProfileKey {
    pub resistant: Fingerprint,
    pub susceptible: Fingerprint,
    pub susceptible_at_high_dose: Fingerprint,
}

impl ProfileKey {
    /// Flat string form used as the match cache key.
    pub fn cache_key(&self) -> String {
        format!(
            "{}_{}_{}",
            self.resistant, self.susceptible, self.susceptible_at_high_dose
        )
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

/// Specimens currently sharing one exact profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub key: ProfileKey,
    pub members: BTreeSet<SpecimenId>,
}

impl ProfileEntry {
    pub fn new(key: ProfileKey) -> Self {
        Self {
            key,
            members: BTreeSet::new(),
        }
    }

    /// A profile counts as a match only when two or more specimens share it.
    pub fn is_match(&self) -> bool {
        self.members.len() >= 2
    }

    pub fn contains(&self, id: &SpecimenId) -> bool {
        self.members.contains(id)
    }
}
