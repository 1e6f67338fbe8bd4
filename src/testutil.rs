//! Fixtures shared by unit tests.

use crate::clean::{COL_MONTH_YEAR, SCHEMA_COLUMNS};
use crate::models::{Cell, CleanedTable, RawTable, Transaction};

/// Header of a typical export: schema columns interleaved with a few
/// administrative ones the cleaner drops.
pub const RAW_HEADER: &[&str] = &[
    "CODIGO TRANSACAO",
    "NOME REDUZIDO",
    "DATA TRANSACAO",
    "FORMA DE PAGAMENTO",
    "PLACA",
    "MODELO VEICULO",
    "MATRICULA",
    "NOME MOTORISTA",
    "SERVICO",
    "TIPO COMBUSTIVEL",
    "LITROS",
    "VL/LITRO",
    "HODOMETRO OU HORIMETRO",
    "KM RODADOS OU HORAS TRABALHADAS",
    "KM/LITRO OU LITROS/HORA",
    "VALOR EMISSAO",
    "CIDADE",
    "NOME ESTABELECIMENTO",
    "UF",
];

pub fn raw_row(
    company: &str,
    date: &str,
    plate: &str,
    fuel: &str,
    liters: f64,
    amount: f64,
) -> Vec<Cell> {
    let price = if liters > 0.0 { amount / liters } else { 0.0 };
    RAW_HEADER
        .iter()
        .map(|col| match *col {
            "CODIGO TRANSACAO" => Cell::Int(900123),
            "NOME REDUZIDO" => Cell::Text(company.into()),
            "DATA TRANSACAO" => Cell::Text(date.into()),
            "FORMA DE PAGAMENTO" => Cell::Text("CARTAO".into()),
            "PLACA" => Cell::Text(plate.into()),
            "MODELO VEICULO" => Cell::Text("STRADA".into()),
            "MATRICULA" => Cell::Int(1001),
            "NOME MOTORISTA" => Cell::Text("JOAO".into()),
            "SERVICO" => Cell::Text(fuel.into()),
            "TIPO COMBUSTIVEL" => Cell::Text(fuel.into()),
            "LITROS" => Cell::Float(liters),
            "VL/LITRO" => Cell::Float(price),
            "HODOMETRO OU HORIMETRO" => Cell::Int(52000),
            "KM RODADOS OU HORAS TRABALHADAS" => Cell::Int(350),
            "KM/LITRO OU LITROS/HORA" => Cell::Float(10.0),
            "VALOR EMISSAO" => Cell::Float(amount),
            "CIDADE" => Cell::Text("CURITIBA".into()),
            "NOME ESTABELECIMENTO" => Cell::Text("POSTO CENTRAL".into()),
            "UF" => Cell::Text("PR".into()),
            _ => Cell::Empty,
        })
        .collect()
}

pub fn raw_table(rows: &[Vec<Cell>]) -> RawTable {
    RawTable {
        columns: RAW_HEADER.iter().map(|c| c.to_string()).collect(),
        rows: rows.to_vec(),
    }
}

/// Build a cleaned record directly. `date` is `YYYY-MM-DD`.
pub fn txn(company: &str, date: &str, plate: &str, fuel: &str, liters: f64, amount: f64) -> Transaction {
    let transaction_date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    Transaction {
        company_name: company.into(),
        transaction_date,
        plate: plate.into(),
        vehicle_model: "STRADA".into(),
        registration: 1001,
        driver_name: "JOAO".into(),
        service: fuel.into(),
        fuel_type: fuel.into(),
        liters,
        price_per_liter: if liters > 0.0 { amount / liters } else { 0.0 },
        odometer_or_hour_meter: 52000,
        distance_or_hours: 350,
        efficiency: Some(10.0),
        amount,
        establishment_name: "POSTO CENTRAL".into(),
        month_year: transaction_date.format("%m/%Y").to_string(),
        extras: Vec::new(),
    }
}

pub fn table(records: Vec<Transaction>) -> CleanedTable {
    let mut columns: Vec<String> = SCHEMA_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.push(COL_MONTH_YEAR.to_string());
    CleanedTable {
        columns,
        extra_columns: Vec::new(),
        records,
    }
}

/// Three companies over two months with mixed fuels.
pub fn fleet() -> CleanedTable {
    table(vec![
        txn("A", "2025-01-05", "AAA1111", "DIESEL", 40.0, 240.0),
        txn("A", "2025-01-20", "AAA2222", "GASOLINA", 30.0, 180.0),
        txn("B", "2025-01-11", "BBB1111", "DIESEL", 50.0, 300.0),
        txn("A", "2025-02-03", "AAA1111", "DIESEL", 45.0, 279.0),
        txn("C", "2025-02-14", "CCC1111", "ETANOL", 20.0, 80.0),
        txn("B", "2025-02-28", "BBB1111", "GASOLINA", 25.0, 155.0),
    ])
}
