use chrono::NaiveDateTime;

/// A single spreadsheet cell with its inferred type.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Canonical text for a cell. Integral floats drop their fraction so that
    /// codes read as numbers come back as `"42"`, not `"42.0"`.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }
}

/// Spreadsheet contents as read from disk, before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }
}

/// One completed fuel purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub company_name: String,
    pub transaction_date: NaiveDateTime,
    pub plate: String,
    pub vehicle_model: String,
    pub registration: i64,
    pub driver_name: String,
    pub service: String,
    pub fuel_type: String,
    pub liters: f64,
    pub price_per_liter: f64,
    pub odometer_or_hour_meter: i64,
    pub distance_or_hours: i64,
    pub efficiency: Option<f64>,
    pub amount: f64,
    pub establishment_name: String,
    /// `MM/YYYY` bucket derived from `transaction_date`.
    pub month_year: String,
    /// Cells for retained columns outside the known schema, aligned with
    /// `CleanedTable::extra_columns`.
    pub extras: Vec<Cell>,
}

/// Output of the cleaning stage. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    /// Retained input columns in their on-disk order, followed by `MES_ANO`.
    pub columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub records: Vec<Transaction>,
}

impl CleanedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Transaction> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_text() {
        assert_eq!(Cell::Float(42.0).to_text(), "42");
        assert_eq!(Cell::Float(4.5).to_text(), "4.5");
        assert_eq!(Cell::Int(-7).to_text(), "-7");
        assert_eq!(Cell::Empty.to_text(), "");
    }

    #[test]
    fn test_datetime_to_text_keeps_fraction() {
        let d = chrono::NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let whole = Cell::DateTime(d.and_hms_opt(9, 30, 0).unwrap());
        assert_eq!(whole.to_text(), "2025-03-15 09:30:00");
        let fractional = Cell::DateTime(d.and_hms_milli_opt(9, 30, 0, 250).unwrap());
        assert_eq!(fractional.to_text(), "2025-03-15 09:30:00.250");
    }

    #[test]
    fn test_cell_is_empty() {
        assert!(Cell::Empty.is_empty());
        assert!(Cell::Text("  ".into()).is_empty());
        assert!(!Cell::Int(0).is_empty());
    }
}
