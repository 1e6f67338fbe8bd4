use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use log::debug;

use crate::clean::parse_datetime;
use crate::error::{FuelError, Result};
use crate::models::{Cell, RawTable};

// ---------------------------------------------------------------------------
// Cell conversion helpers
// ---------------------------------------------------------------------------

/// Excel serial day number (1899-12-30 epoch) to a timestamp, keeping the
/// time-of-day fraction. Serials outside chrono's range yield `None`.
pub fn excel_serial_to_datetime(serial: f64) -> Option<chrono::NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(chrono::TimeDelta::try_milliseconds(millis)?)
}

fn cell_from_data(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            excel_serial_to_datetime(serial)
                .map(Cell::DateTime)
                .unwrap_or(Cell::Float(serial))
        }
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
        #[allow(unreachable_patterns)]
        _ => Cell::Empty,
    }
}

/// CSV fields stay text so "007" or "1E5" survive; the cleaner parses the
/// numeric and date columns itself.
fn csv_cell(raw: &str) -> Cell {
    if raw.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(raw.to_string())
    }
}

/// First non-empty row becomes the header; fully empty rows are skipped and
/// short rows are padded so every row has one cell per column.
fn build_table<I>(path: &Path, rows: I) -> Result<RawTable>
where
    I: IntoIterator<Item = Vec<Cell>>,
{
    let mut rows = rows.into_iter().filter(|r| !r.iter().all(Cell::is_empty));
    let header = rows
        .next()
        .ok_or_else(|| FuelError::ingest(path, "no header row found"))?;
    let columns: Vec<String> = header.iter().map(|c| c.to_text().trim().to_string()).collect();

    let width = columns.len();
    let rows = rows
        .map(|mut r| {
            r.resize(width, Cell::Empty);
            r
        })
        .collect();

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum SourceKind {
    Workbook,
    Csv,
}

fn source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SourceKind::Workbook),
        "csv" => Some(SourceKind::Csv),
        _ => None,
    }
}

fn read_workbook(path: &Path) -> Result<RawTable> {
    use calamine::Reader;

    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|e| FuelError::ingest(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| FuelError::ingest(path, "workbook has no worksheets"))?
        .map_err(|e| FuelError::ingest(path, e))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>());
    build_table(path, rows)
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| FuelError::ingest(path, e))?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| FuelError::ingest(path, e))?;
        rows.push(record.iter().map(csv_cell).collect::<Vec<_>>());
    }
    build_table(path, rows)
}

/// Read a spreadsheet from disk without touching any cache.
pub fn read_table(path: &Path) -> Result<RawTable> {
    if !path.exists() {
        return Err(FuelError::ingest(path, "file not found"));
    }
    match source_kind(path) {
        Some(SourceKind::Workbook) => read_workbook(path),
        Some(SourceKind::Csv) => read_csv(path),
        None => Err(FuelError::ingest(
            path,
            "unsupported file type (expected .xlsx, .xls, .ods or .csv)",
        )),
    }
}

// ---------------------------------------------------------------------------
// Ingestor with path-keyed cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

fn fingerprint(path: &Path) -> Result<Fingerprint> {
    let meta = std::fs::metadata(path).map_err(|e| FuelError::ingest(path, e))?;
    Ok(Fingerprint {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}

struct CacheEntry {
    fingerprint: Fingerprint,
    table: Arc<RawTable>,
}

/// Loads spreadsheets and keeps each one in memory by canonical path. An
/// entry is dropped when the file's size or modification time changes.
#[derive(Default)]
pub struct Ingestor {
    cache: HashMap<PathBuf, CacheEntry>,
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<Arc<RawTable>> {
        let key = std::fs::canonicalize(path).map_err(|e| FuelError::ingest(path, e))?;
        let current = fingerprint(&key)?;

        if let Some(entry) = self.cache.get(&key) {
            if entry.fingerprint == current {
                debug!("cache hit for {}", key.display());
                return Ok(Arc::clone(&entry.table));
            }
            debug!("{} changed on disk, re-reading", key.display());
        }

        let table = Arc::new(read_table(&key)?);
        debug!(
            "loaded {} rows x {} columns from {}",
            table.rows.len(),
            table.columns.len(),
            key.display()
        );
        self.cache.insert(
            key,
            CacheEntry {
                fingerprint: current,
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    /// Drop the cached table for `path`. Returns whether an entry existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.cache.remove(&key).is_some()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
