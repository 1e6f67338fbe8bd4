use chrono::NaiveDateTime;

use crate::error::Result;

/// Shown in place of a value that cannot be computed or rendered.
pub const PLACEHOLDER: &str = "—";

/// Group the integer part with `.` and use `,` for the two decimals: 1.234,56
fn br_number(val: f64) -> Option<String> {
    if !val.is_finite() {
        return None;
    }
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.')?;

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    // -0.001 rounds to 0,00 and must not keep its sign
    let is_zero = int_part.chars().chain(dec_part.chars()).all(|c| c == '0');
    if val < 0.0 && !is_zero {
        Some(format!("-{grouped},{dec_part}"))
    } else {
        Some(format!("{grouped},{dec_part}"))
    }
}

/// Format a value as Brazilian reais: R$ 1.234,56
pub fn format_currency(val: f64) -> String {
    match br_number(val) {
        Some(n) => format!("R$ {n}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format a plain decimal with two places: 1.000,00
pub fn format_decimal(val: f64) -> String {
    br_number(val).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Currency for a computed ratio, placeholder when it is not applicable.
pub fn format_ratio(ratio: Result<f64>) -> String {
    match ratio {
        Ok(v) => format_currency(v),
        Err(_) => PLACEHOLDER.to_string(),
    }
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%d/%m/%Y %H:%M:%S").to_string()
}

/// Whole-number rendering with `.` grouping, used for counts.
pub fn number(n: usize) -> String {
    let s = n.to_string();
    let mut out = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out.chars().rev().collect()
}
