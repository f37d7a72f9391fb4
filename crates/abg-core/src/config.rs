//! Service configuration.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use abg_map::DEFAULT_THRESHOLD;
use abg_match::DEFAULT_CACHE_CAPACITY;

const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";
const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("similarity threshold {0} is outside 0..=100")]
    Threshold(u8),

    #[error("UTC offset of {0} minutes is out of range")]
    UtcOffset(i32),
}

/// Tunables for [`LabService`](crate::LabService). Every field has a default,
/// so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Labels must score strictly above this to be recognised.
    pub similarity_threshold: u8,
    /// Maximum number of cached profile entries.
    pub cache_capacity: usize,
    /// `chrono` pattern for request and collection dates.
    pub date_format: String,
    /// Offset the spreadsheet dates are written in.
    pub utc_offset_minutes: i32,
    /// Listing limit when the caller gives none.
    pub page_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            utc_offset_minutes: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but falls back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(error) => {
                tracing::warn!(%error, "using default config");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.similarity_threshold > 100 {
            return Err(ConfigError::Threshold(self.similarity_threshold));
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::UtcOffset(self.utc_offset_minutes))
    }
}
