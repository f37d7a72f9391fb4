//! Header and result label resolution.
//!
//! Spreadsheet exports from different laboratory systems disagree on
//! spelling, spacing and capitalisation. Raw labels are scored against the
//! canonical labels of [`CanonicalColumn`] and [`TestOutcome`] and accepted
//! only above a similarity threshold.
//!
//! [`CanonicalColumn`]: abg_model::CanonicalColumn
//! [`TestOutcome`]: abg_model::TestOutcome

#![deny(unsafe_code)]

mod header;
mod resolver;
mod score;

pub use header::{HeaderMap, RowValues};
pub use resolver::{CanonicalLabel, DEFAULT_THRESHOLD, LabelResolver, Scored};
pub use score::{normalize_label, similarity};
