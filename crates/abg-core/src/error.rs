//! Pipeline error types.

use thiserror::Error;

use abg_model::{CanonicalColumn, SpecimenId};
use abg_store::StoreError;

/// A date cell that does not follow the configured pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' does not match date format '{format}'")]
pub struct InvalidDate {
    pub value: String,
    pub format: String,
}

/// A specimen dropped from its batch because one of its dates is unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("specimen {specimen_id}: unreadable {column}")]
pub struct RowParseError {
    pub specimen_id: SpecimenId,
    pub column: CanonicalColumn,
    #[source]
    pub source: InvalidDate,
}

/// A sheet rejected as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    #[error("sheet has no header row")]
    Empty,

    #[error("sheet could not be read: {message}")]
    Unreadable { message: String },

    #[error("missing required columns: {}", format_columns(.missing))]
    MissingColumns { missing: Vec<CanonicalColumn> },
}

fn format_columns(columns: &[CanonicalColumn]) -> String {
    columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure that aborts the current operation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
