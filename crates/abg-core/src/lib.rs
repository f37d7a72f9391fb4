//! Antibiogram ingestion and lookup.
//!
//! Uploaded spreadsheets flow through the pipeline as:
//!
//! 1. grid reading ([`abg_ingest`])
//! 2. header resolution and result classification ([`abg_map`])
//! 3. row filtering and per-specimen aggregation ([`SpecimenAggregator`])
//! 4. merge-upsert into the record store, then re-indexing of the merged
//!    records in the [`MatchIndex`](abg_match::MatchIndex)
//!
//! [`LabService`] is the entry point for all of it, and for listing,
//! fetching, deleting and matching stored specimens.

#![deny(unsafe_code)]

pub mod aggregate;
pub mod config;
pub mod dates;
pub mod error;
pub mod report;
pub mod service;

pub use aggregate::{SheetBatch, SpecimenAggregator, keep_row};
pub use config::{ConfigError, ServiceConfig};
pub use dates::DateParser;
pub use error::{InvalidDate, PipelineError, Result, RowParseError, SheetError};
pub use report::{FileOutcome, FileReport, IngestReport, SheetOutcome, SheetReport, SheetSummary};
pub use service::{LabService, MatchedRecord, UploadedFile};
