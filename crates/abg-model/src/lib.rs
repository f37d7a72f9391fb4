//! Antibiogram data model.
//!
//! Types shared by every stage of the antibiogram pipeline:
//!
//! - [`CanonicalColumn`] / [`TestOutcome`]: the fixed labels raw spreadsheet
//!   text is resolved to
//! - [`SpecimenRecord`]: one specimen with its resistant, susceptible and
//!   high-dose antibiotic sets
//! - [`ProfileKey`] / [`ProfileEntry`]: the secondary index grouping specimens
//!   that share an identical antibiotic profile

#![deny(unsafe_code)]

pub mod columns;
pub mod error;
pub mod ids;
pub mod profile;
pub mod record;

pub use columns::{CanonicalColumn, TestOutcome};
pub use error::{ModelError, Result};
pub use ids::SpecimenId;
pub use profile::{Fingerprint, ProfileEntry, ProfileKey};
pub use record::{AntibioticSet, Antibiogram, Page, RecordFilter, SpecimenRecord};
