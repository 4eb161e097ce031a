//! Cell coercion into canonical typed values.
//!
//! Cleaning is a pure, total function: every unparseable cell maps to a
//! kind-specific sentinel instead of an error, so the pipeline always
//! produces output for a well-formed row-set.

use chrono::DateTime;

use crate::{
    data::{Dataset, Record, Value, parse_flexible_date},
    infer::{ColumnMap, ColumnRole},
};

/// Sentinel written for Time cells that cannot be parsed as a date.
pub const UNKNOWN_DATE: &str = "unknown date";
/// Sentinel written for empty or missing Dimension cells.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Days between the spreadsheet serial epoch (1899-12-30) and 1970-01-01.
const SERIAL_UNIX_OFFSET_DAYS: f64 = 25_569.0;
const SECONDS_PER_DAY: i64 = 86_400;
/// Serials at or below this are not treated as dates during cleaning.
const SERIAL_FLOOR: f64 = 30_000.0;

/// Coerces every cell of every record per its column's classification.
/// Records keep the key-set of the input; the output never contains `Null`.
pub fn clean(dataset: &Dataset, mapping: &ColumnMap) -> Vec<Record> {
    dataset
        .rows
        .iter()
        .map(|row| {
            let mut cleaned = row.clone();
            for (name, value) in row {
                cleaned.insert(name.clone(), clean_cell(value, mapping.role_of(name)));
            }
            cleaned
        })
        .collect()
}

pub fn clean_cell(value: &Value, role: ColumnRole) -> Value {
    match role {
        ColumnRole::Metric => Value::Number(value.numeric_or_zero()),
        ColumnRole::Time => Value::Text(coerce_time(value)),
        ColumnRole::Dimension => Value::Text(coerce_dimension(value)),
    }
}

fn coerce_time(value: &Value) -> String {
    if let Value::Number(serial) = value
        && *serial > SERIAL_FLOOR
        && let Some(date) = serial_to_date(*serial)
    {
        return date;
    }
    match parse_flexible_date(&value.as_display()) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => UNKNOWN_DATE.to_string(),
    }
}

fn coerce_dimension(value: &Value) -> String {
    if value.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        value.as_display()
    }
}

/// Converts a spreadsheet date serial to a `YYYY-MM-DD` string:
/// `days = floor(serial - 25569)`, interpreted as whole days from the Unix
/// epoch in UTC.
pub fn serial_to_date(serial: f64) -> Option<String> {
    let days = (serial - SERIAL_UNIX_OFFSET_DAYS).floor() as i64;
    let seconds = days.checked_mul(SECONDS_PER_DAY)?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
}
