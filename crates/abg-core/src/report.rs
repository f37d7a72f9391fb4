//! Upload reports.

use abg_model::SpecimenId;

use crate::error::{RowParseError, SheetError};

/// Result of one upload, file by file and sheet by sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
}

impl IngestReport {
    pub fn sheets(&self) -> impl Iterator<Item = &SheetReport> {
        self.files.iter().flat_map(|file| match &file.outcome {
            FileOutcome::Read { sheets } => sheets.as_slice(),
            FileOutcome::Unreadable { .. } => &[],
        })
    }

    /// Specimens written across all sheets.
    pub fn specimens_stored(&self) -> usize {
        self.sheets()
            .filter_map(SheetReport::summary)
            .map(|summary| summary.stored.len())
            .sum()
    }

    pub fn sheets_rejected(&self) -> usize {
        self.sheets()
            .filter(|sheet| matches!(sheet.outcome, SheetOutcome::Rejected(_)))
            .count()
    }

    pub fn files_unreadable(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.outcome, FileOutcome::Unreadable { .. }))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.files_unreadable() == 0
            && self.sheets_rejected() == 0
            && self
                .sheets()
                .filter_map(SheetReport::summary)
                .all(|summary| summary.dropped.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Read { sheets: Vec<SheetReport> },
    /// The bytes are not in any supported grid format.
    Unreadable { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReport {
    pub sheet: String,
    pub outcome: SheetOutcome,
}

impl SheetReport {
    pub fn summary(&self) -> Option<&SheetSummary> {
        match &self.outcome {
            SheetOutcome::Ingested(summary) => Some(summary),
            SheetOutcome::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetOutcome {
    Ingested(SheetSummary),
    Rejected(SheetError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSummary {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub unclassified: usize,
    /// Specimens upserted, in order of first appearance.
    pub stored: Vec<SpecimenId>,
    /// Specimens placed in the match index.
    pub indexed: usize,
    pub dropped: Vec<RowParseError>,
}
