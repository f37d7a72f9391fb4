//! Row filtering and per-specimen aggregation.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use chrono::{DateTime, Utc};

use abg_ingest::Sheet;
use abg_map::{HeaderMap, LabelResolver, RowValues};
use abg_model::{CanonicalColumn, SpecimenId, SpecimenRecord};

use crate::dates::DateParser;
use crate::error::{RowParseError, SheetError};

/// True if the row carries a specimen id and an antibiotic cell.
pub fn keep_row(values: &RowValues) -> bool {
    values
        .get(&CanonicalColumn::SpecimenId)
        .is_some_and(|id| !id.is_empty())
        && values.contains_key(&CanonicalColumn::AntibioticName)
}

/// Specimens folded out of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetBatch {
    /// One record per specimen, in order of first appearance.
    pub records: Vec<SpecimenRecord>,
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows skipped because their result matched no outcome.
    pub unclassified: usize,
    /// Specimens left out because of an unreadable date.
    pub dropped: Vec<RowParseError>,
}

/// Turns a sheet of raw rows into per-specimen records.
#[derive(Debug, Clone)]
pub struct SpecimenAggregator {
    resolver: LabelResolver,
    dates: DateParser,
}

impl SpecimenAggregator {
    pub fn new(resolver: LabelResolver, dates: DateParser) -> Self {
        Self { resolver, dates }
    }

    pub fn resolver(&self) -> &LabelResolver {
        &self.resolver
    }

    /// Fails when the header lacks a required column. Everything below the
    /// header is best effort: bad rows are skipped and bad specimens dropped.
    pub fn aggregate_sheet(
        &self,
        sheet: &Sheet,
        uploaded_at: DateTime<Utc>,
    ) -> Result<SheetBatch, SheetError> {
        if let Some(message) = &sheet.read_error {
            return Err(SheetError::Unreadable {
                message: message.clone(),
            });
        }
        let header = sheet.header().ok_or(SheetError::Empty)?;
        let columns = HeaderMap::resolve(&self.resolver, &header.cells);
        let missing = columns.missing_required();
        if !missing.is_empty() {
            return Err(SheetError::MissingColumns { missing });
        }

        let mut batch = SheetBatch::default();
        let mut groups: Vec<(SpecimenId, Vec<RowValues>)> = Vec::new();
        let mut positions: HashMap<SpecimenId, usize> = HashMap::new();

        for row in sheet.data_rows() {
            batch.rows_read += 1;
            let values = columns.project(&row.cells);
            if !keep_row(&values) {
                continue;
            }
            let Some(id) = values
                .get(&CanonicalColumn::SpecimenId)
                .and_then(|raw| SpecimenId::new(raw.as_str()).ok())
            else {
                continue;
            };
            batch.rows_kept += 1;
            match positions.entry(id) {
                Entry::Occupied(slot) => groups[*slot.get()].1.push(values),
                Entry::Vacant(slot) => {
                    groups.push((slot.key().clone(), vec![values]));
                    slot.insert(groups.len() - 1);
                }
            }
        }

        for (id, rows) in groups {
            match self.fold_group(id, &rows, uploaded_at, &mut batch.unclassified) {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    tracing::warn!(sheet = %sheet.name, %error, "dropping specimen");
                    batch.dropped.push(error);
                }
            }
        }

        tracing::debug!(
            sheet = %sheet.name,
            rows = batch.rows_read,
            kept = batch.rows_kept,
            specimens = batch.records.len(),
            dropped = batch.dropped.len(),
            unclassified = batch.unclassified,
            "aggregated sheet"
        );
        Ok(batch)
    }

    /// Descriptive fields and dates come from the first row; later rows only
    /// contribute antibiotics.
    fn fold_group(
        &self,
        specimen_id: SpecimenId,
        rows: &[RowValues],
        uploaded_at: DateTime<Utc>,
        unclassified: &mut usize,
    ) -> Result<SpecimenRecord, RowParseError> {
        let mut record = SpecimenRecord::new(specimen_id, uploaded_at);

        if let Some(first) = rows.first() {
            record.patient_name = text(first, CanonicalColumn::PatientName);
            record.department = text(first, CanonicalColumn::Department);
            record.organism = text(first, CanonicalColumn::Organism);
            record.requested_at = self.date(first, CanonicalColumn::RequestDate, &record.specimen_id)?;
            record.collected_at = self.date(first, CanonicalColumn::SpecimenDate, &record.specimen_id)?;
        }

        for row in rows {
            let Some(antibiotic) = text(row, CanonicalColumn::AntibioticName) else {
                continue;
            };
            let outcome = row
                .get(&CanonicalColumn::Result)
                .and_then(|raw| self.resolver.classify_result(raw));
            match outcome {
                Some(outcome) => {
                    record.antibiogram.set_mut(outcome).insert(antibiotic);
                }
                None => *unclassified += 1,
            }
        }
        Ok(record)
    }

    fn date(
        &self,
        row: &RowValues,
        column: CanonicalColumn,
        specimen_id: &SpecimenId,
    ) -> Result<Option<DateTime<Utc>>, RowParseError> {
        let Some(raw) = row.get(&column) else {
            return Ok(None);
        };
        self.dates.parse(raw).map_err(|source| RowParseError {
            specimen_id: specimen_id.clone(),
            column,
            source,
        })
    }
}

fn text(row: &RowValues, column: CanonicalColumn) -> Option<String> {
    row.get(&column)
        .filter(|value| !value.is_empty())
        .cloned()
}
