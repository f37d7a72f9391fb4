//! Delimited text decoding.

use csv::ReaderBuilder;

use crate::error::{IngestError, Result};
use crate::grid::{GridRow, Sheet};

const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Reads a delimited text file as a single sheet named after the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedReader {
    delimiter: Option<u8>,
}

impl DelimitedReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the delimiter instead of sniffing it from the first line.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn read(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Sheet>> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(bytes));
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record.map_err(|source| IngestError::Delimited {
                file: file_name.to_string(),
                source,
            })?;
            let row: GridRow = record
                .iter()
                .map(|field| String::from_utf8_lossy(field).trim().to_string())
                .collect();
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        tracing::debug!(file = file_name, rows = rows.len(), "read delimited file");
        Ok(vec![Sheet::new(sheet_name(file_name), rows)])
    }
}

/// Picks the candidate delimiter occurring most often on the first line.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let mut best = (b',', 0usize);
    for candidate in CANDIDATE_DELIMITERS {
        let count = first_line.iter().filter(|b| **b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

fn sheet_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}
