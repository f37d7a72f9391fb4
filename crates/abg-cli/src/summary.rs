use chrono::{DateTime, Utc};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use abg_core::{FileOutcome, IngestReport, MatchedRecord, SheetOutcome, SheetReport};
use abg_model::{AntibioticSet, Page, SpecimenId, SpecimenRecord, TestOutcome};

const DATE_DISPLAY: &str = "%Y-%m-%d %H:%M";

pub fn print_ingest_report(report: &IngestReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Sheet"),
        header_cell("Status"),
        header_cell("Rows"),
        header_cell("Kept"),
        header_cell("Specimens"),
        header_cell("Indexed"),
        header_cell("Dropped"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    for file in &report.files {
        match &file.outcome {
            FileOutcome::Unreadable { error } => {
                table.add_row(vec![
                    Cell::new(&file.file_name),
                    dim_cell("-"),
                    Cell::new(format!("unreadable: {error}")).fg(Color::Red),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                    dim_cell("-"),
                ]);
            }
            FileOutcome::Read { sheets } => {
                for sheet in sheets {
                    let row = match &sheet.outcome {
                        SheetOutcome::Ingested(summary) => vec![
                            Cell::new(&file.file_name),
                            Cell::new(&sheet.sheet),
                            Cell::new("ok").fg(Color::Green),
                            Cell::new(summary.rows_read),
                            Cell::new(summary.rows_kept),
                            Cell::new(summary.stored.len()),
                            Cell::new(summary.indexed),
                            count_cell(summary.dropped.len(), Color::Yellow),
                        ],
                        SheetOutcome::Rejected(error) => vec![
                            Cell::new(&file.file_name),
                            Cell::new(&sheet.sheet),
                            Cell::new(format!("rejected: {error}")).fg(Color::Red),
                            dim_cell("-"),
                            dim_cell("-"),
                            dim_cell("-"),
                            dim_cell("-"),
                            dim_cell("-"),
                        ],
                    };
                    table.add_row(row);
                }
            }
        }
    }
    println!("{table}");

    let dropped: Vec<_> = report
        .sheets()
        .filter_map(SheetReport::summary)
        .flat_map(|summary| summary.dropped.iter())
        .collect();
    if !dropped.is_empty() {
        eprintln!("Dropped specimens:");
        for error in dropped {
            eprintln!("- {error}: {}", error.source);
        }
    }
}

pub fn print_listing(page: &Page<MatchedRecord>, offset: usize) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Specimen"),
        header_cell("Patient"),
        header_cell("Department"),
        header_cell("Organism"),
        header_cell("Collected"),
        header_cell("R"),
        header_cell("S"),
        header_cell("HD"),
        header_cell("Shared with"),
    ]);
    apply_table_style(&mut table);
    for index in 5..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for item in &page.items {
        let record = &item.record;
        table.add_row(vec![
            Cell::new(record.specimen_id.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            text_cell(record.patient_name.as_deref()),
            text_cell(record.department.as_deref()),
            text_cell(record.organism.as_deref()),
            date_cell(record.collected_at),
            count_cell(record.antibiogram.resistant.len(), Color::Red),
            count_cell(record.antibiogram.susceptible.len(), Color::Green),
            count_cell(record.antibiogram.susceptible_at_high_dose.len(), Color::Yellow),
            shared_cell(item),
        ]);
    }
    println!("{table}");
    let shown_to = offset + page.items.len();
    if page.items.is_empty() {
        println!("No specimens ({} total)", page.total);
    } else {
        println!("Showing {}-{} of {}", offset + 1, shown_to, page.total);
    }
}

pub fn print_records(records: &[MatchedRecord]) {
    for item in records {
        print_record(&item.record);
        println!("Shared with: {}", others(item).unwrap_or_else(|| "-".to_string()));
        println!();
    }
}

pub fn print_matches(item: &MatchedRecord) {
    let Some(entry) = &item.matched else {
        println!(
            "No other specimen shares the profile of {}",
            item.record.specimen_id
        );
        return;
    };
    let mut table = Table::new();
    table.set_header(vec![header_cell("Specimen"), header_cell("Profile")]);
    apply_table_style(&mut table);
    for member in &entry.members {
        let cell = if *member == item.record.specimen_id {
            Cell::new(format!("{member} (this)")).add_attribute(Attribute::Bold)
        } else {
            Cell::new(member.as_str())
        };
        table.add_row(vec![cell, dim_cell(entry.key.cache_key())]);
    }
    println!("{table}");
}

fn print_record(record: &SpecimenRecord) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Specimen"),
        Cell::new(record.specimen_id.as_str())
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold),
    ]);
    apply_table_style(&mut table);
    table.add_row(vec![Cell::new("Patient"), text_cell(record.patient_name.as_deref())]);
    table.add_row(vec![Cell::new("Department"), text_cell(record.department.as_deref())]);
    table.add_row(vec![Cell::new("Organism"), text_cell(record.organism.as_deref())]);
    table.add_row(vec![Cell::new("Requested"), date_cell(record.requested_at)]);
    table.add_row(vec![Cell::new("Collected"), date_cell(record.collected_at)]);
    table.add_row(vec![Cell::new("Last upload"), date_cell(Some(record.uploaded_at))]);
    for outcome in TestOutcome::ALL {
        table.add_row(vec![
            outcome_cell(outcome),
            antibiotics_cell(record.antibiogram.set(outcome)),
        ]);
    }
    println!("{table}");
}

fn others(item: &MatchedRecord) -> Option<String> {
    let entry = item.matched.as_ref()?;
    let names: Vec<&str> = entry
        .members
        .iter()
        .filter(|member| **member != item.record.specimen_id)
        .map(SpecimenId::as_str)
        .collect();
    Some(names.join(", "))
}

fn shared_cell(item: &MatchedRecord) -> Cell {
    match others(item) {
        Some(names) => Cell::new(names).fg(Color::Magenta),
        None => dim_cell("-"),
    }
}

fn outcome_cell(outcome: TestOutcome) -> Cell {
    let color = match outcome {
        TestOutcome::Resistant => Color::Red,
        TestOutcome::Susceptible => Color::Green,
        TestOutcome::SusceptibleAtHighDose => Color::Yellow,
    };
    Cell::new(outcome.label()).fg(color)
}

fn antibiotics_cell(set: &AntibioticSet) -> Cell {
    if set.is_empty() {
        return dim_cell("-");
    }
    let names: Vec<&str> = set.iter().map(String::as_str).collect();
    Cell::new(names.join(", "))
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn text_cell(value: Option<&str>) -> Cell {
    match value {
        Some(text) => Cell::new(text),
        None => dim_cell("-"),
    }
}

fn date_cell(value: Option<DateTime<Utc>>) -> Cell {
    match value {
        Some(at) => Cell::new(at.format(DATE_DISPLAY)),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
