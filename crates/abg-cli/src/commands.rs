use std::fs;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use abg_cli::logging::redact_value;
use abg_cli::workspace::Workspace;
use abg_core::{IngestReport, MatchedRecord, UploadedFile};
use abg_model::{Page, RecordFilter, SpecimenId};

use crate::cli::{IdArgs, IngestArgs, ListArgs, MatchArgs};

pub fn run_ingest(workspace: &Workspace, args: &IngestArgs) -> Result<IngestReport> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(UploadedFile::new(name, bytes));
    }

    let report = workspace.service().ingest_files(&files)?;
    workspace.persist()?;
    Ok(report)
}

pub fn run_list(workspace: &Workspace, args: &ListArgs) -> Result<Page<MatchedRecord>> {
    let offset = workspace.service().config().utc_offset()?;
    let filter = RecordFilter {
        collected_from: args
            .from
            .map(|day| local_instant(day, NaiveTime::MIN, offset))
            .transpose()?,
        collected_to: args
            .to
            .map(|day| local_instant(day, end_of_day(), offset))
            .transpose()?,
        patient_name: args.patient.clone(),
    };
    Ok(workspace
        .service()
        .list_records(&filter, args.limit, args.offset)?)
}

pub fn run_show(workspace: &Workspace, args: &IdArgs) -> Result<Vec<MatchedRecord>> {
    let ids = parse_ids(&args.ids)?;
    let found = workspace.service().get_records(&ids)?;
    for item in &found {
        tracing::debug!(
            specimen = %item.record.specimen_id,
            patient = redact_value(item.record.patient_name.as_deref().unwrap_or_default()),
            "fetched specimen"
        );
    }
    if found.len() < ids.len() {
        tracing::warn!(requested = ids.len(), found = found.len(), "some specimens were not found");
    }
    Ok(found)
}

pub fn run_matches(workspace: &Workspace, args: &MatchArgs) -> Result<MatchedRecord> {
    let id = SpecimenId::new(args.id.as_str()).context("invalid specimen id")?;
    match workspace.service().get_record(&id)? {
        Some(found) => Ok(found),
        None => bail!("unknown specimen {id}"),
    }
}

pub fn run_delete(workspace: &Workspace, args: &IdArgs) -> Result<usize> {
    let ids = parse_ids(&args.ids)?;
    let removed = workspace.service().delete_records(&ids)?;
    workspace.persist()?;
    Ok(removed)
}

fn parse_ids(raw: &[String]) -> Result<Vec<SpecimenId>> {
    raw.iter()
        .map(|id| {
            SpecimenId::new(id.as_str()).with_context(|| format!("invalid specimen id '{id}'"))
        })
        .collect()
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

fn local_instant(
    day: NaiveDate,
    time: NaiveTime,
    offset: chrono::FixedOffset,
) -> Result<DateTime<Utc>> {
    offset
        .from_local_datetime(&day.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .with_context(|| format!("date {day} is out of range"))
}
