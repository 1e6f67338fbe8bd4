use chrono::NaiveDateTime;
use log::debug;

use crate::error::{FuelError, Result};
use crate::ingest::excel_serial_to_datetime;
use crate::models::{Cell, CleanedTable, RawTable, Transaction};

// ---------------------------------------------------------------------------
// Column schema
// ---------------------------------------------------------------------------

pub const COL_COMPANY: &str = "NOME REDUZIDO";
pub const COL_DATE: &str = "DATA TRANSACAO";
pub const COL_PLATE: &str = "PLACA";
pub const COL_MODEL: &str = "MODELO VEICULO";
pub const COL_REGISTRATION: &str = "MATRICULA";
pub const COL_DRIVER: &str = "NOME MOTORISTA";
pub const COL_SERVICE: &str = "SERVICO";
pub const COL_FUEL: &str = "TIPO COMBUSTIVEL";
pub const COL_LITERS: &str = "LITROS";
pub const COL_PRICE: &str = "VL/LITRO";
pub const COL_ODOMETER: &str = "HODOMETRO OU HORIMETRO";
pub const COL_DISTANCE: &str = "KM RODADOS OU HORAS TRABALHADAS";
pub const COL_EFFICIENCY: &str = "KM/LITRO OU LITROS/HORA";
pub const COL_AMOUNT: &str = "VALOR EMISSAO";
pub const COL_ESTABLISHMENT: &str = "NOME ESTABELECIMENTO";

/// Derived month bucket column appended by [`clean`].
pub const COL_MONTH_YEAR: &str = "MES_ANO";

/// Every column a transaction is built from, in the export's usual order.
pub const SCHEMA_COLUMNS: &[&str] = &[
    COL_COMPANY,
    COL_DATE,
    COL_PLATE,
    COL_MODEL,
    COL_REGISTRATION,
    COL_DRIVER,
    COL_SERVICE,
    COL_FUEL,
    COL_LITERS,
    COL_PRICE,
    COL_ODOMETER,
    COL_DISTANCE,
    COL_EFFICIENCY,
    COL_AMOUNT,
    COL_ESTABLISHMENT,
];

/// Administrative columns with no reporting value.
pub const REMOVED_COLUMNS: &[&str] = &[
    "CODIGO TRANSACAO",
    "FORMA DE PAGAMENTO",
    "CODIGO CLIENTE",
    "TIPO FROTA",
    "NUMERO FROTA",
    "ANO",
    "CODIGO ESTABELECIMENTO",
    "TIPO ESTABELECIMENTO",
    "ENDERECO",
    "BAIRRO",
    "CIDADE",
    "UF",
    "INFORMACAO ADIDIONAL 1",
    "INFORMACAO ADIDIONAL 2",
    "INFORMACAO ADIDIONAL 3",
    "INFORMACAO ADIDIONAL 4",
    "INFORMACAO ADIDIONAL 5",
    "FORMA TRANSACAO",
    "CODIGO LIBERACAO RESTRICAO",
    "SERIE POS",
    "NUMERO CARTAO",
    "FAMILIA VEICULO",
    "GRUPO RESTRICAO",
    "CODIGO EMISSORA",
    "RESPONSAVEL",
    "TIPO ENTRADA HODOMETRO",
];

fn is_removed(column: &str) -> bool {
    REMOVED_COLUMNS.contains(&column.trim())
}

fn is_schema(column: &str) -> bool {
    let c = column.trim();
    SCHEMA_COLUMNS.contains(&c) || c == COL_MONTH_YEAR
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Parse a timestamp written as text. Accepts ISO and day-first layouts,
/// with or without a time part.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    const WITH_TIME: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
    ];
    for fmt in WITH_TIME {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(d) = chrono::NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Numeric text with either `.` or `,` as the decimal mark. When both appear,
/// `.` is taken as the thousands separator (1.234,50).
fn parse_decimal_text(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_start_matches("R$").trim();
    let normalized = if s.contains(',') {
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };
    normalized.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn coerce_text(cell: &Cell) -> String {
    cell.to_text()
}

fn coerce_int(cell: &Cell) -> std::result::Result<i64, &'static str> {
    match cell {
        Cell::Int(i) => Ok(*i),
        Cell::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        Cell::Float(_) => Err("expected a whole number"),
        Cell::Text(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(i);
            }
            match parse_decimal_text(s) {
                Some(f) if f.fract() == 0.0 => Ok(f as i64),
                _ => Err("expected a whole number"),
            }
        }
        Cell::Empty => Err("missing value"),
        _ => Err("expected a whole number"),
    }
}

fn coerce_decimal(cell: &Cell) -> std::result::Result<f64, &'static str> {
    match cell {
        Cell::Int(i) => Ok(*i as f64),
        Cell::Float(f) if f.is_finite() => Ok(*f),
        Cell::Text(s) => parse_decimal_text(s).ok_or("expected a number"),
        Cell::Empty => Err("missing value"),
        _ => Err("expected a number"),
    }
}

fn coerce_optional_decimal(cell: &Cell) -> std::result::Result<Option<f64>, &'static str> {
    if cell.is_empty() {
        return Ok(None);
    }
    coerce_decimal(cell).map(Some)
}

fn coerce_datetime(cell: &Cell) -> std::result::Result<NaiveDateTime, &'static str> {
    match cell {
        Cell::DateTime(dt) => Ok(*dt),
        Cell::Text(s) => parse_datetime(s).ok_or("unparsable date"),
        Cell::Float(f) => excel_serial_to_datetime(*f).ok_or("unparsable date"),
        Cell::Int(i) => excel_serial_to_datetime(*i as f64).ok_or("unparsable date"),
        Cell::Empty => Err("missing date"),
        Cell::Bool(_) => Err("unparsable date"),
    }
}

pub fn month_year(dt: &NaiveDateTime) -> String {
    dt.format("%m/%Y").to_string()
}

// ---------------------------------------------------------------------------
// clean
// ---------------------------------------------------------------------------

/// Positions of the schema columns in a raw table.
struct ColumnIndex {
    company: usize,
    date: usize,
    plate: usize,
    model: usize,
    registration: usize,
    driver: usize,
    service: usize,
    fuel: usize,
    liters: usize,
    price: usize,
    odometer: usize,
    distance: usize,
    efficiency: usize,
    amount: usize,
    establishment: usize,
}

impl ColumnIndex {
    fn resolve(raw: &RawTable) -> Result<Self> {
        let missing: Vec<&str> = SCHEMA_COLUMNS
            .iter()
            .copied()
            .filter(|c| raw.column_index(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(FuelError::DataFormat(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        // Every lookup below succeeded in the check above.
        let idx = |name: &str| raw.column_index(name).unwrap_or_default();
        Ok(Self {
            company: idx(COL_COMPANY),
            date: idx(COL_DATE),
            plate: idx(COL_PLATE),
            model: idx(COL_MODEL),
            registration: idx(COL_REGISTRATION),
            driver: idx(COL_DRIVER),
            service: idx(COL_SERVICE),
            fuel: idx(COL_FUEL),
            liters: idx(COL_LITERS),
            price: idx(COL_PRICE),
            odometer: idx(COL_ODOMETER),
            distance: idx(COL_DISTANCE),
            efficiency: idx(COL_EFFICIENCY),
            amount: idx(COL_AMOUNT),
            establishment: idx(COL_ESTABLISHMENT),
        })
    }
}

fn field<T>(
    row_no: usize,
    column: &str,
    value: std::result::Result<T, &'static str>,
) -> Result<T> {
    value.map_err(|reason| {
        FuelError::DataFormat(format!("row {row_no}, column '{column}': {reason}"))
    })
}

/// Drop administrative columns, coerce types, and derive `MES_ANO`.
/// Any bad value rejects the whole table.
pub fn clean(raw: &RawTable) -> Result<CleanedTable> {
    let idx = ColumnIndex::resolve(raw)?;

    let extra_positions: Vec<usize> = raw
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !is_removed(c) && !is_schema(c))
        .map(|(i, _)| i)
        .collect();
    let extra_columns: Vec<String> = extra_positions
        .iter()
        .map(|&i| raw.columns[i].clone())
        .collect();

    let mut columns: Vec<String> = raw
        .columns
        .iter()
        .filter(|c| !is_removed(c) && c.trim() != COL_MONTH_YEAR)
        .cloned()
        .collect();
    columns.push(COL_MONTH_YEAR.to_string());

    let mut records = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        let n = i + 1;
        let cell = |pos: usize| row.get(pos).unwrap_or(&Cell::Empty);

        let transaction_date = field(n, COL_DATE, coerce_datetime(cell(idx.date)))?;
        let liters = field(n, COL_LITERS, coerce_decimal(cell(idx.liters)))?;
        let amount = field(n, COL_AMOUNT, coerce_decimal(cell(idx.amount)))?;
        if liters < 0.0 {
            return Err(FuelError::DataFormat(format!(
                "row {n}, column '{COL_LITERS}': negative volume {liters}"
            )));
        }
        if amount < 0.0 {
            return Err(FuelError::DataFormat(format!(
                "row {n}, column '{COL_AMOUNT}': negative amount {amount}"
            )));
        }

        records.push(Transaction {
            company_name: coerce_text(cell(idx.company)),
            transaction_date,
            plate: coerce_text(cell(idx.plate)),
            vehicle_model: coerce_text(cell(idx.model)),
            registration: field(n, COL_REGISTRATION, coerce_int(cell(idx.registration)))?,
            driver_name: coerce_text(cell(idx.driver)),
            service: coerce_text(cell(idx.service)),
            fuel_type: coerce_text(cell(idx.fuel)),
            liters,
            price_per_liter: field(n, COL_PRICE, coerce_decimal(cell(idx.price)))?,
            odometer_or_hour_meter: field(n, COL_ODOMETER, coerce_int(cell(idx.odometer)))?,
            distance_or_hours: field(n, COL_DISTANCE, coerce_int(cell(idx.distance)))?,
            efficiency: field(n, COL_EFFICIENCY, coerce_optional_decimal(cell(idx.efficiency)))?,
            amount,
            establishment_name: coerce_text(cell(idx.establishment)),
            month_year: month_year(&transaction_date),
            extras: extra_positions.iter().map(|&p| cell(p).clone()).collect(),
        });
    }

    debug!(
        "cleaned {} rows, kept {} of {} columns",
        records.len(),
        columns.len() - 1,
        raw.columns.len()
    );

    Ok(CleanedTable {
        columns,
        extra_columns,
        records,
    })
}

/// Cell holding a record's value for a cleaned column name.
fn cell_for(table: &CleanedTable, record: &Transaction, column: &str) -> Cell {
    match column {
        COL_COMPANY => Cell::Text(record.company_name.clone()),
        COL_DATE => Cell::DateTime(record.transaction_date),
        COL_PLATE => Cell::Text(record.plate.clone()),
        COL_MODEL => Cell::Text(record.vehicle_model.clone()),
        COL_REGISTRATION => Cell::Int(record.registration),
        COL_DRIVER => Cell::Text(record.driver_name.clone()),
        COL_SERVICE => Cell::Text(record.service.clone()),
        COL_FUEL => Cell::Text(record.fuel_type.clone()),
        COL_LITERS => Cell::Float(record.liters),
        COL_PRICE => Cell::Float(record.price_per_liter),
        COL_ODOMETER => Cell::Int(record.odometer_or_hour_meter),
        COL_DISTANCE => Cell::Int(record.distance_or_hours),
        COL_EFFICIENCY => record.efficiency.map(Cell::Float).unwrap_or(Cell::Empty),
        COL_AMOUNT => Cell::Float(record.amount),
        COL_ESTABLISHMENT => Cell::Text(record.establishment_name.clone()),
        COL_MONTH_YEAR => Cell::Text(record.month_year.clone()),
        other => table
            .extra_columns
            .iter()
            .position(|c| c == other)
            .and_then(|p| record.extras.get(p).cloned())
            .unwrap_or(Cell::Empty),
    }
}

impl CleanedTable {
    /// Flatten back into a raw table with the cleaned column layout; cleaning
    /// the result yields the same records.
    pub fn to_raw(&self) -> RawTable {
        let rows = self
            .records
            .iter()
            .map(|r| {
                self.columns
                    .iter()
                    .map(|c| cell_for(self, r, c.trim()))
                    .collect()
            })
            .collect();
        RawTable {
            columns: self.columns.clone(),
            rows,
        }
    }
}
