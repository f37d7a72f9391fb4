use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("specimen identifier must not be blank")]
    BlankSpecimenId,
    #[error("invalid fingerprint '{0}': expected lowercase hex digest")]
    InvalidFingerprint(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
