//! Import adapters and output writers.
//!
//! The pipeline core never parses file bytes; these adapters turn delimited
//! text or a JSON array of objects into a [`Dataset`] of raw records. CSV
//! fields arrive as text scalars (the shape text-upload adapters produce);
//! JSON rows may carry real numbers, which is where spreadsheet date
//! serials enter the pipeline.

use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use serde_json::Value as JsonValue;

use crate::data::{Dataset, Record, Value};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Reads a dataset of raw records, dispatching on extension: `.json` goes
/// through the JSON adapter, everything else is treated as delimited text.
pub fn read_dataset(path: &Path, delimiter: Option<u8>) -> Result<Dataset> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => read_json(path),
        _ => read_csv(path, resolve_input_delimiter(path, delimiter)),
    }
}

pub fn read_csv(path: &Path, delimiter: u8) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Opening {path:?}"))?;
    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("Reading headers from {path:?}"))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Reading row {}", idx + 2))?;
        let mut row = Record::new();
        for (col, name) in columns.iter().enumerate() {
            let value = match record.get(col) {
                Some(field) => Value::Text(field.to_string()),
                None => Value::Null,
            };
            row.insert(name.clone(), value);
        }
        rows.push(row);
    }
    Ok(Dataset::new(columns, rows))
}

/// Reads a JSON array of flat objects, the shape spreadsheet adapters emit.
pub fn read_json(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Opening {path:?}"))?;
    let parsed: Vec<serde_json::Map<String, JsonValue>> =
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing JSON rows from {path:?}"))?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    for object in parsed {
        let mut row = Record::new();
        for (name, value) in object {
            if !columns.contains(&name) {
                columns.push(name.clone());
            }
            row.insert(name, json_scalar(value)?);
        }
        rows.push(row);
    }
    Ok(Dataset::new(columns, rows))
}

fn json_scalar(value: JsonValue) -> Result<Value> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(0.0))),
        JsonValue::String(s) => Ok(Value::Text(s)),
        JsonValue::Bool(b) => Ok(Value::Text(b.to_string())),
        other => Err(anyhow!("Unsupported nested value in JSON row: {other}")),
    }
}

/// CSV writer to a file path, or stdout when the path is absent or `-`.
pub fn open_csv_writer(path: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match path {
        Some(path) if path != Path::new("-") => Box::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        ),
        _ => Box::new(std::io::stdout().lock()),
    };
    Ok(csv::WriterBuilder::new().from_writer(sink))
}
