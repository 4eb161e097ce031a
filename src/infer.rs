//! Column role classification.
//!
//! Roles are derived from a single sampled row (the first record of an
//! import) and held fixed for the dataset's lifetime. The single-row sample
//! is a deliberate, cheap heuristic: a column whose first value is blank or
//! atypical is mis-tagged for the whole dataset. That behavior is part of
//! the contract and must not be "fixed" by scanning further rows.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{Record, Value, parse_flexible_date};

/// Lower/upper bound (exclusive) of the numeric range treated as a
/// spreadsheet date serial during classification.
pub const SERIAL_RANGE: (f64, f64) = (30_000.0, 60_000.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Time,
    Metric,
    Dimension,
}

impl ColumnRole {
    pub fn label(self) -> &'static str {
        match self {
            ColumnRole::Time => "time",
            ColumnRole::Metric => "metric",
            ColumnRole::Dimension => "dimension",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub name: String,
    pub role: ColumnRole,
}

/// Ordered column-name → role table carried alongside every dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMap {
    pub columns: Vec<ColumnBinding>,
}

impl ColumnMap {
    /// Classifies each named column from its sampled value, in priority
    /// order: Time, then Metric, then Dimension as the fallback.
    pub fn classify(columns: &[String], sample: &Record) -> Self {
        let bindings = columns
            .iter()
            .map(|name| {
                let value = sample.get(name).unwrap_or(&Value::Null);
                ColumnBinding {
                    name: name.clone(),
                    role: classify_value(value),
                }
            })
            .collect();
        ColumnMap { columns: bindings }
    }

    /// Columns absent from the map are unclassified; downstream consumers
    /// treat them as Dimension.
    pub fn role_of(&self, name: &str) -> ColumnRole {
        self.columns
            .iter()
            .find(|binding| binding.name == name)
            .map(|binding| binding.role)
            .unwrap_or(ColumnRole::Dimension)
    }

    pub fn with_role(&self, role: ColumnRole) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|binding| binding.role == role)
            .map(|binding| binding.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating map file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing column map JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening map file {path:?}"))?;
        let reader = BufReader::new(file);
        let map = serde_json::from_reader(reader).context("Parsing column map JSON")?;
        Ok(map)
    }
}

fn classify_value(value: &Value) -> ColumnRole {
    let date_like = match value {
        // A text cell counts as Time only when it parses as a date but not
        // as a plain number ("2024" alone is numeric, not a date).
        Value::Text(s) => parse_flexible_date(s).is_some() && s.trim().parse::<f64>().is_err(),
        Value::Number(n) => *n > SERIAL_RANGE.0 && *n < SERIAL_RANGE.1,
        Value::Null => false,
    };
    if date_like {
        ColumnRole::Time
    } else if value.as_number().is_some() {
        ColumnRole::Metric
    } else {
        ColumnRole::Dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn classifies_dates_numbers_and_text() {
        let columns = vec!["day".to_string(), "amount".to_string(), "region".to_string()];
        let row = sample(&[
            ("day", Value::Text("2024-01-05".into())),
            ("amount", Value::Number(12.5)),
            ("region", Value::Text("North".into())),
        ]);
        let map = ColumnMap::classify(&columns, &row);
        assert_eq!(map.role_of("day"), ColumnRole::Time);
        assert_eq!(map.role_of("amount"), ColumnRole::Metric);
        assert_eq!(map.role_of("region"), ColumnRole::Dimension);
    }

    #[test]
    fn serial_range_numbers_classify_as_time() {
        let columns = vec!["when".to_string(), "count".to_string()];
        let row = sample(&[
            ("when", Value::Number(45000.0)),
            ("count", Value::Number(29999.0)),
        ]);
        let map = ColumnMap::classify(&columns, &row);
        assert_eq!(map.role_of("when"), ColumnRole::Time);
        assert_eq!(map.role_of("count"), ColumnRole::Metric);
    }

    #[test]
    fn blank_sample_value_falls_back_to_dimension() {
        // Single-row sampling: a blank first value tags the whole column as
        // Dimension even if every later row is numeric.
        let columns = vec!["amount".to_string()];
        let row = sample(&[("amount", Value::Null)]);
        let map = ColumnMap::classify(&columns, &row);
        assert_eq!(map.role_of("amount"), ColumnRole::Dimension);
    }

    #[test]
    fn unknown_column_defaults_to_dimension() {
        let map = ColumnMap::default();
        assert_eq!(map.role_of("anything"), ColumnRole::Dimension);
    }
}
