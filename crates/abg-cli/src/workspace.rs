//! On-disk data directory holding the store snapshot and config.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use fs2::FileExt;

use abg_core::{LabService, ServiceConfig};
use abg_store::{
    MemoryProfileStore, MemoryRecordStore, StoreSnapshot, load_snapshot, save_snapshot,
};

const SNAPSHOT_FILE: &str = "store.json";
const CONFIG_FILE: &str = "config.toml";
const LOCK_FILE: &str = ".lock";

/// Exclusive advisory lock on a data directory, released on drop.
struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    /// Blocks until no other process or workspace holds the directory.
    fn acquire(root: &Path) -> Result<Self> {
        let path = root.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("open lock file {}", path.display()))?;
        if file.try_lock_exclusive().is_err() {
            tracing::info!(path = %path.display(), "data directory in use, waiting for lock");
            file.lock_exclusive()
                .with_context(|| format!("lock data directory {}", root.display()))?;
        }
        tracing::debug!(path = %path.display(), "acquired data directory lock");
        Ok(Self { file, path })
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(error) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), %error, "failed to release data directory lock");
        }
    }
}

/// A data directory opened for one command run.
///
/// Opening takes an exclusive lock on the directory that is held until the
/// workspace is dropped, so a snapshot is never loaded while another run is
/// between its own load and save. The stores are loaded from the snapshot on
/// open and written back by [`persist`](Self::persist).
pub struct Workspace {
    root: PathBuf,
    records: Arc<MemoryRecordStore>,
    profiles: Arc<MemoryProfileStore>,
    service: LabService,
    _lock: DirLock,
}

impl Workspace {
    /// Opens `root`, creating it when missing. `config_path` defaults to
    /// `config.toml` inside the directory.
    pub fn open(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("create data directory {}", root.display()))?;
        let lock = DirLock::acquire(root)?;

        let config = match config_path {
            Some(path) => ServiceConfig::load(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => ServiceConfig::load_or_default(&root.join(CONFIG_FILE)),
        };

        let snapshot_path = root.join(SNAPSHOT_FILE);
        let (records, profiles) = match load_snapshot(&snapshot_path)
            .with_context(|| format!("load snapshot {}", snapshot_path.display()))?
        {
            Some(snapshot) => snapshot.restore(),
            None => (MemoryRecordStore::new(), MemoryProfileStore::new()),
        };
        let records = Arc::new(records);
        let profiles = Arc::new(profiles);
        let stored = records.len()?;
        tracing::debug!(root = %root.display(), records = stored, "opened data directory");

        let service = LabService::new(config, records.clone(), profiles.clone())
            .context("invalid service config")?;
        Ok(Self {
            root: root.to_path_buf(),
            records,
            profiles,
            service,
            _lock: lock,
        })
    }

    pub fn service(&self) -> &LabService {
        &self.service
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    /// Writes both stores back to the snapshot file.
    pub fn persist(&self) -> Result<()> {
        let snapshot = StoreSnapshot::capture(&self.records, &self.profiles)?;
        let path = self.snapshot_path();
        save_snapshot(&snapshot, &path)
            .with_context(|| format!("save snapshot {}", path.display()))?;
        tracing::info!(
            records = snapshot.records.len(),
            profiles = snapshot.profiles.len(),
            "saved snapshot"
        );
        Ok(())
    }
}
