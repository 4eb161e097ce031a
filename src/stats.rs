//! Descriptive statistics for metric columns.

use anyhow::{Result, anyhow};
use log::info;
use serde::Serialize;

use crate::{
    cli::StatsArgs,
    clean,
    data::{Record, Value, format_number},
    formula, infer, io_utils, table,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub name: String,
    pub mean: f64,
    pub median: f64,
    pub p75: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

impl MetricStats {
    pub fn zero(name: &str) -> Self {
        MetricStats {
            name: name.to_string(),
            mean: 0.0,
            median: 0.0,
            p75: 0.0,
            min: 0.0,
            max: 0.0,
            sum: 0.0,
        }
    }
}

/// Computes the six summary numbers for one metric across a row-set.
/// Non-numeric entries are dropped; an empty collection yields all zeros.
///
/// Median and p75 use lower-biased floor indexing into the sorted values
/// (`floor(count * 0.5)` / `floor(count * 0.75)`). This is deliberately not
/// interpolated: the indexing convention is part of the contract.
pub fn metric_stats(rows: &[Record], metric: &str) -> MetricStats {
    let mut values: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get(metric).and_then(Value::as_number))
        .collect();
    if values.is_empty() {
        return MetricStats::zero(metric);
    }
    values.sort_by(f64::total_cmp);

    let count = values.len();
    let sum: f64 = values.iter().sum();
    MetricStats {
        name: metric.to_string(),
        mean: sum / count as f64,
        median: values[(count as f64 * 0.5).floor() as usize],
        p75: values[(count as f64 * 0.75).floor() as usize],
        min: values[0],
        max: values[count - 1],
        sum,
    }
}

/// `stats` subcommand: clean the input, apply any formulas, and print the
/// summary table for the chosen (default: all) metric columns.
pub fn execute(args: &StatsArgs) -> Result<()> {
    let dataset = io_utils::read_dataset(&args.input, args.delimiter)?;
    let sample = dataset
        .sample_row()
        .ok_or_else(|| anyhow!("{:?} contains no data rows", args.input))?;
    let mapping = infer::ColumnMap::classify(&dataset.columns, sample);
    let cleaned = clean::clean(&dataset, &mapping);
    let spec = args.formula.join("\n");
    let rows = formula::apply_formulas(&cleaned, &spec);

    let metrics: Vec<String> = if args.metrics.is_empty() {
        let mut names: Vec<String> = mapping
            .with_role(infer::ColumnRole::Metric)
            .into_iter()
            .map(str::to_string)
            .collect();
        names.extend(formula::formula_targets(&spec));
        names
    } else {
        args.metrics
            .iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    };
    if metrics.is_empty() {
        return Err(anyhow!(
            "No metric columns available. Supply --metrics to continue."
        ));
    }

    let headers: Vec<String> = ["metric", "sum", "mean", "median", "p75", "min", "max"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let table_rows: Vec<Vec<String>> = metrics
        .iter()
        .map(|metric| {
            let stats = metric_stats(&rows, metric);
            vec![
                stats.name.clone(),
                format_number(stats.sum),
                format!("{:.4}", stats.mean),
                format_number(stats.median),
                format_number(stats.p75),
                format_number(stats.min),
                format_number(stats.max),
            ]
        })
        .collect();
    table::print_table(&headers, &table_rows);
    info!(
        "Computed summary statistics for {} metric(s) over {} row(s)",
        metrics.len(),
        rows.len()
    );
    Ok(())
}
