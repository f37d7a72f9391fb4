use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Specimen (barcode) identifier, stable across uploads.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpecimenId(String);

impl SpecimenId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::BlankSpecimenId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecimenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SpecimenId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SpecimenId> for String {
    fn from(value: SpecimenId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let id = SpecimenId::new("  B1 \n").unwrap();
        assert_eq!(id.as_str(), "B1");
    }

    #[test]
    fn rejects_blank() {
        assert_eq!(SpecimenId::new("   "), Err(ModelError::BlankSpecimenId));
    }

    #[test]
    fn blank_id_fails_to_deserialize() {
        let parsed: Result<SpecimenId, _> = serde_json::from_str("\" \"");
        assert!(parsed.is_err());
    }
}
