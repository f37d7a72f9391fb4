//! Binary workbook decoding.

use std::fmt::Write as _;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::error::{IngestError, Result};
use crate::grid::{GridRow, Sheet};

/// Pattern used to render native date cells as text.
///
/// Matches the pattern the aggregator parses by default, so typed date cells
/// and text date cells end up indistinguishable.
pub const DEFAULT_CELL_DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Reads every sheet of a workbook. The container format (legacy binary,
/// Office Open XML, OpenDocument) is sniffed from the bytes.
#[derive(Debug, Clone)]
pub struct WorkbookReader {
    date_format: String,
}

impl Default for WorkbookReader {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookReader {
    pub fn new() -> Self {
        Self {
            date_format: DEFAULT_CELL_DATE_FORMAT.to_string(),
        }
    }

    #[must_use]
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Fails only when the container cannot be opened. A sheet whose cells
    /// cannot be decoded is returned as [`Sheet::unreadable`].
    pub fn read(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>> {
        let mut workbook =
            open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| IngestError::Workbook {
                file: file_name.to_string(),
                message: e.to_string(),
            })?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names() {
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(error) => {
                    tracing::warn!(file = file_name, sheet = %sheet_name, %error, "could not read sheet");
                    sheets.push(Sheet::unreadable(sheet_name, error.to_string()));
                    continue;
                }
            };

            let rows: Vec<GridRow> = range
                .rows()
                .map(|row| {
                    let mut cells: Vec<String> =
                        row.iter().map(|cell| self.cell_text(cell)).collect();
                    // Rectangular ranges pad short rows; drop the padding.
                    while cells.last().is_some_and(String::is_empty) {
                        cells.pop();
                    }
                    GridRow::new(cells)
                })
                .collect();

            tracing::debug!(file = file_name, sheet = %sheet_name, rows = rows.len(), "read sheet");
            sheets.push(Sheet::new(sheet_name, rows));
        }
        Ok(sheets)
    }

    fn cell_text(&self, cell: &Data) -> String {
        match cell {
            Data::Empty | Data::Error(_) => String::new(),
            Data::DateTime(value) => {
                let Some(datetime) = value.as_datetime() else {
                    return cell.to_string();
                };
                let mut rendered = String::new();
                match write!(rendered, "{}", datetime.format(&self.date_format)) {
                    Ok(()) => rendered,
                    Err(_) => cell.to_string(),
                }
            }
            other => other.to_string().trim().to_string(),
        }
    }
}
