//! Format dispatch.

use crate::delimited::DelimitedReader;
use crate::error::Result;
use crate::grid::Sheet;
use crate::workbook::WorkbookReader;

const DELIMITED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

/// Source of sheets for uploaded file content.
pub trait GridSource: Send + Sync {
    fn read_sheets(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>>;
}

impl GridSource for WorkbookReader {
    fn read_sheets(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>> {
        self.read(file_name, bytes)
    }
}

impl GridSource for DelimitedReader {
    fn read_sheets(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>> {
        self.read(file_name, bytes)
    }
}

/// Reads delimited text for `.csv`/`.tsv`/`.txt` names and treats
/// everything else as a workbook.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetReader {
    workbook: WorkbookReader,
    delimited: DelimitedReader,
}

impl SpreadsheetReader {
    pub fn new(workbook: WorkbookReader, delimited: DelimitedReader) -> Self {
        Self {
            workbook,
            delimited,
        }
    }

    fn is_delimited(file_name: &str) -> bool {
        file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| DELIMITED_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl GridSource for SpreadsheetReader {
    fn read_sheets(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>> {
        if Self::is_delimited(file_name) {
            self.delimited.read(file_name, bytes)
        } else {
            self.workbook.read(file_name, bytes)
        }
    }
}
