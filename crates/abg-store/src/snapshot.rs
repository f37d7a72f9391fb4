//! JSON snapshots of the in-process stores.
//!
//! Writes go to a temporary sibling file that is renamed over the target, so
//! a crash mid-write leaves the previous snapshot intact.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use abg_model::{ProfileEntry, SpecimenRecord};

use crate::error::{Result, StoreError};
use crate::memory::{MemoryProfileStore, MemoryRecordStore};

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

/// Full content of both stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub records: Vec<SpecimenRecord>,
    pub profiles: Vec<ProfileEntry>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl StoreSnapshot {
    pub fn capture(records: &MemoryRecordStore, profiles: &MemoryProfileStore) -> Result<Self> {
        Ok(Self {
            version: CURRENT_SNAPSHOT_VERSION,
            records: records.records()?,
            profiles: profiles.entries()?,
        })
    }

    pub fn restore(self) -> (MemoryRecordStore, MemoryProfileStore) {
        (
            MemoryRecordStore::from_records(self.records),
            MemoryProfileStore::from_entries(self.profiles),
        )
    }
}

/// Writes `snapshot` to `path` atomically.
pub fn save_snapshot(snapshot: &StoreSnapshot, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot).map_err(|source| {
        StoreError::Serialization {
            path: path.to_path_buf(),
            source,
        }
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|source| StoreError::Io {
        operation: "create",
        path: temp_path.clone(),
        source,
    })?;
    file.write_all(&bytes).map_err(|source| StoreError::Io {
        operation: "write",
        path: temp_path.clone(),
        source,
    })?;
    file.sync_all().map_err(|source| StoreError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source,
    })?;
    fs::rename(&temp_path, path).map_err(|source| StoreError::Io {
        operation: "rename",
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        path = %path.display(),
        records = snapshot.records.len(),
        profiles = snapshot.profiles.len(),
        "saved store snapshot"
    );
    Ok(())
}

/// Reads a snapshot, or `None` when `path` does not exist yet.
pub fn load_snapshot(path: &Path) -> Result<Option<StoreSnapshot>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                operation: "read",
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let probe: VersionProbe =
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
    if probe.version > CURRENT_SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: probe.version,
            max_supported: CURRENT_SNAPSHOT_VERSION,
        });
    }

    let snapshot: StoreSnapshot =
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(
        path = %path.display(),
        records = snapshot.records.len(),
        profiles = snapshot.profiles.len(),
        "loaded store snapshot"
    );
    Ok(Some(snapshot))
}
