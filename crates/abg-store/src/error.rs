//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Storage failure. Always fatal to the batch that hit it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot serve requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// File I/O error while reading or writing a snapshot.
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot content could not be encoded or decoded.
    #[error("invalid snapshot {path}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot written by a newer schema.
    #[error("snapshot version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion { found: u32, max_supported: u32 },
}

impl StoreError {
    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Unavailable(format!("{what} lock poisoned"))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
