//! Persistence for specimen records and the profile match index.
//!
//! The pipeline talks to storage only through [`RecordStore`] and
//! [`ProfileStore`]. Both are implemented in-process by [`MemoryRecordStore`]
//! and [`MemoryProfileStore`], which can be written to and restored from a
//! JSON snapshot on disk.
//!
//! Records follow merge semantics on upsert: antibiotic sets only grow,
//! descriptive fields and business dates are written once, and the upload
//! time always moves forward.

#![deny(unsafe_code)]

mod error;
mod memory;
mod snapshot;
mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryProfileStore, MemoryRecordStore};
pub use snapshot::{CURRENT_SNAPSHOT_VERSION, StoreSnapshot, load_snapshot, save_snapshot};
pub use traits::{ProfileStore, RecordStore};
