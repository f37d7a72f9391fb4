//! The lab service facade.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use abg_ingest::{DelimitedReader, GridSource, SpreadsheetReader, WorkbookReader};
use abg_map::LabelResolver;
use abg_match::{MatchCache, MatchIndex};
use abg_model::{Page, ProfileEntry, ProfileKey, RecordFilter, SpecimenId, SpecimenRecord};
use abg_store::{MemoryProfileStore, MemoryRecordStore, ProfileStore, RecordStore};

use crate::aggregate::{SheetBatch, SpecimenAggregator};
use crate::config::{ConfigError, ServiceConfig};
use crate::dates::DateParser;
use crate::error::Result;
use crate::report::{FileOutcome, FileReport, IngestReport, SheetOutcome, SheetReport, SheetSummary};

/// Complete content of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A stored record together with the specimens sharing its profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRecord {
    pub record: SpecimenRecord,
    pub matched: Option<ProfileEntry>,
}

/// Ingests uploads and answers queries over the stored specimens.
///
/// Safe to share between threads; concurrent uploads touching the same
/// specimen are reconciled by the stores and the match index.
pub struct LabService {
    config: ServiceConfig,
    reader: Box<dyn GridSource>,
    aggregator: SpecimenAggregator,
    records: Arc<dyn RecordStore>,
    index: MatchIndex,
}

impl LabService {
    pub fn new(
        config: ServiceConfig,
        records: Arc<dyn RecordStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let dates = DateParser::new(config.date_format.clone(), config.utc_offset()?);
        let reader = SpreadsheetReader::new(
            WorkbookReader::new().with_date_format(config.date_format.clone()),
            DelimitedReader::new(),
        );
        Ok(Self {
            reader: Box::new(reader),
            aggregator: SpecimenAggregator::new(
                LabelResolver::new(config.similarity_threshold),
                dates,
            ),
            records,
            index: MatchIndex::new(profiles, MatchCache::new(config.cache_capacity)),
            config,
        })
    }

    /// Service over fresh in-process stores.
    pub fn in_memory(config: ServiceConfig) -> std::result::Result<Self, ConfigError> {
        Self::new(
            config,
            Arc::new(MemoryRecordStore::new()),
            Arc::new(MemoryProfileStore::new()),
        )
    }

    /// Replaces the spreadsheet decoder.
    #[must_use]
    pub fn with_reader(mut self, reader: impl GridSource + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn index(&self) -> &MatchIndex {
        &self.index
    }

    pub fn ingest(&self, file_name: &str, bytes: &[u8]) -> Result<IngestReport> {
        let file = self.ingest_file(file_name, bytes, Utc::now())?;
        Ok(IngestReport { files: vec![file] })
    }

    /// Ingests several files as one upload sharing one upload time.
    ///
    /// A store failure stops the upload; files and sheets already processed
    /// stay written.
    pub fn ingest_files(&self, files: &[UploadedFile]) -> Result<IngestReport> {
        let uploaded_at = Utc::now();
        let mut report = IngestReport::default();
        for file in files {
            report
                .files
                .push(self.ingest_file(&file.name, &file.bytes, uploaded_at)?);
        }
        tracing::info!(
            files = report.files.len(),
            specimens = report.specimens_stored(),
            rejected_sheets = report.sheets_rejected(),
            unreadable_files = report.files_unreadable(),
            "upload processed"
        );
        Ok(report)
    }

    fn ingest_file(
        &self,
        file_name: &str,
        bytes: &[u8],
        uploaded_at: DateTime<Utc>,
    ) -> Result<FileReport> {
        let sheets = match self.reader.read_sheets(file_name, bytes) {
            Ok(sheets) => sheets,
            Err(error) => {
                tracing::warn!(file = file_name, %error, "unreadable file");
                return Ok(FileReport {
                    file_name: file_name.to_string(),
                    outcome: FileOutcome::Unreadable {
                        error: error.to_string(),
                    },
                });
            }
        };

        let mut reports = Vec::with_capacity(sheets.len());
        for sheet in &sheets {
            let outcome = match self.aggregator.aggregate_sheet(sheet, uploaded_at) {
                Ok(batch) => SheetOutcome::Ingested(self.persist(batch, uploaded_at)?),
                Err(error) => {
                    tracing::warn!(file = file_name, sheet = %sheet.name, %error, "rejected sheet");
                    SheetOutcome::Rejected(error)
                }
            };
            reports.push(SheetReport {
                sheet: sheet.name.clone(),
                outcome,
            });
        }

        Ok(FileReport {
            file_name: file_name.to_string(),
            outcome: FileOutcome::Read { sheets: reports },
        })
    }

    /// Upserts the batch, then indexes the merged records the store returns.
    fn persist(&self, batch: SheetBatch, uploaded_at: DateTime<Utc>) -> Result<SheetSummary> {
        let stored = self.records.upsert_many(&batch.records, uploaded_at)?;
        let update = self.index.update(&stored)?;
        Ok(SheetSummary {
            rows_read: batch.rows_read,
            rows_kept: batch.rows_kept,
            unclassified: batch.unclassified,
            stored: stored.into_iter().map(|record| record.specimen_id).collect(),
            indexed: update.indexed,
            dropped: batch.dropped,
        })
    }

    /// `None` when the record has no classified antibiotics.
    pub fn derive_profile(&self, record: &SpecimenRecord) -> Option<ProfileKey> {
        abg_match::derive_profile(&record.antibiogram)
    }

    /// Entry shared by `record` and at least one other specimen.
    pub fn lookup_match(&self, record: &SpecimenRecord) -> Result<Option<ProfileEntry>> {
        Ok(self.index.lookup(record)?)
    }

    /// Newest collection date first; `limit` defaults to the configured page size.
    pub fn list_records(
        &self,
        filter: &RecordFilter,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Page<MatchedRecord>> {
        let limit = limit.unwrap_or(self.config.page_size);
        let page = self.records.find_page(filter, limit, offset)?;
        let items = page
            .items
            .into_iter()
            .map(|record| self.with_match(record))
            .collect::<Result<Vec<_>>>()?;
        Ok(Page {
            items,
            total: page.total,
        })
    }

    pub fn get_record(&self, id: &SpecimenId) -> Result<Option<MatchedRecord>> {
        self.records
            .find_by_id(id)?
            .map(|record| self.with_match(record))
            .transpose()
    }

    /// Found records in the order requested. Unknown ids are skipped.
    pub fn get_records(&self, ids: &[SpecimenId]) -> Result<Vec<MatchedRecord>> {
        self.records
            .find_by_ids(ids)?
            .into_iter()
            .map(|record| self.with_match(record))
            .collect()
    }

    /// Removes the record and its match index membership.
    pub fn delete_record(&self, id: &SpecimenId) -> Result<bool> {
        let removed = self.records.delete_by_id(id)?;
        self.index.remove(id)?;
        tracing::info!(specimen = %id, removed, "deleted specimen");
        Ok(removed)
    }

    pub fn delete_records(&self, ids: &[SpecimenId]) -> Result<usize> {
        let removed = self.records.delete_by_ids(ids)?;
        self.index.remove_many(ids)?;
        tracing::info!(requested = ids.len(), removed, "deleted specimens");
        Ok(removed)
    }

    fn with_match(&self, record: SpecimenRecord) -> Result<MatchedRecord> {
        let matched = self.index.lookup(&record)?;
        Ok(MatchedRecord { record, matched })
    }
}
