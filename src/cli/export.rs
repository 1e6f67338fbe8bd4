use std::path::Path;

use crate::error::Result;
use crate::filter::{filter, Selections};
use crate::ingest::Ingestor;
use crate::models::CleanedTable;
use crate::present::{render, DetailTable, LayoutKind};

use super::{load_table, FilterArgs};

/// Write the detail table, headers first, exactly as displayed.
pub fn write_detail_csv(detail: &DetailTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(detail.headers)?;
    for row in &detail.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the matching records in the cleaned column layout, unformatted.
/// Returns the number of records written.
pub fn write_cleaned_csv(table: &CleanedTable, selections: &Selections, path: &Path) -> Result<usize> {
    let subset = CleanedTable {
        columns: table.columns.clone(),
        extra_columns: table.extra_columns.clone(),
        records: filter(table.rows(), selections).into_iter().cloned().collect(),
    };
    let raw = subset.to_raw();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&raw.columns)?;
    for row in &raw.rows {
        wtr.write_record(row.iter().map(|c| c.to_text()))?;
    }
    wtr.flush()?;
    Ok(raw.rows.len())
}

pub fn run(file: Option<&str>, output: &str, filters: &FilterArgs, cleaned: bool) -> Result<()> {
    let mut ingestor = Ingestor::new();
    let (_, table) = load_table(&mut ingestor, file)?;
    let selections = filters.selections();
    let path = Path::new(output);
    let written = if cleaned {
        write_cleaned_csv(&table, &selections, path)?
    } else {
        let view = render(&table, &selections, LayoutKind::Wide);
        write_detail_csv(&view.detail, path)?;
        view.detail.rows.len()
    };
    println!("Wrote {written} rows to {}", path.display());
    Ok(())
}
