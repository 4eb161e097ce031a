//! Filtering and aggregation over cleaned row-sets.
//!
//! [`process`] produces the global processed dataset shared by every chart:
//! formulas first, then the inclusive time-range filter, then the
//! per-dimension allow-set filters (logical AND across dimensions). Each
//! chart re-derives its own view from that dataset through [`chart_rows`]
//! using its frozen configuration snapshot.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result, anyhow};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    cli::ProcessArgs,
    clean,
    config::{DashboardConfig, SUMMARY_AXIS},
    data::{Record, Value},
    formula, infer, io_utils, table,
};

/// Grouping bucket name used when no group column is configured.
pub const GLOBAL_GROUP: &str = "global";
/// Bucket for records whose group value is missing or empty.
pub const UNGROUPED: &str = "ungrouped";

/// Time-range and per-dimension allow-set filters.
///
/// The date range is inactive when either bound is empty, and always
/// inactive in summary mode. A dimension absent from `dimension_filters` or
/// mapped to an empty set is not filtered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    pub date_range: (String, String),
    pub dimension_filters: HashMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn date_range_active(&self, config: &DashboardConfig) -> bool {
        !config.x_axis.is_empty()
            && !config.is_summary()
            && !self.date_range.0.is_empty()
            && !self.date_range.1.is_empty()
    }
}

/// Derives the global processed dataset: formulas, then time range, then
/// dimension allow-sets.
pub fn process(rows: &[Record], config: &DashboardConfig, filters: &FilterState) -> Vec<Record> {
    let mut result = formula::apply_formulas(rows, &config.formulas);

    if filters.date_range_active(config) {
        let (lower, upper) = &filters.date_range;
        result.retain(|row| {
            let value = row
                .get(&config.x_axis)
                .map(Value::as_display)
                .unwrap_or_default();
            value.as_str() >= lower.as_str() && value.as_str() <= upper.as_str()
        });
    }

    for (dimension, allowed) in &filters.dimension_filters {
        if allowed.is_empty() {
            continue;
        }
        result.retain(|row| {
            let value = row.get(dimension).map(Value::as_display).unwrap_or_default();
            allowed.contains(&value)
        });
    }

    result
}

/// Summary mode: group records by the configured group column (or the
/// global bucket when unset), sum each configured metric per group, and
/// order groups descending by the first metric's sum. Ties keep first-seen
/// order.
pub fn summarize(rows: &[Record], config: &DashboardConfig) -> Vec<Record> {
    let group_key = summary_group_key(config);
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Record> = HashMap::new();

    for row in rows {
        let label = match row.get(group_key.as_str()) {
            Some(value) if !value.is_empty() => value.as_display(),
            _ => UNGROUPED.to_string(),
        };
        let bucket = groups.entry(label.clone()).or_insert_with(|| {
            order.push(label.clone());
            let mut seed = Record::new();
            seed.insert(group_key.clone(), Value::Text(label.clone()));
            for metric in &config.metrics {
                seed.insert(metric.clone(), Value::Number(0.0));
            }
            seed
        });
        for metric in &config.metrics {
            let addend = row.get(metric).map(Value::numeric_or_zero).unwrap_or(0.0);
            let total = bucket.get(metric).map(Value::numeric_or_zero).unwrap_or(0.0);
            bucket.insert(metric.clone(), Value::Number(total + addend));
        }
    }

    let mut result: Vec<Record> = order
        .into_iter()
        .filter_map(|label| groups.remove(&label))
        .collect();
    if let Some(first_metric) = config.metrics.first() {
        result.sort_by(|a, b| {
            let left = a.get(first_metric).map(Value::numeric_or_zero).unwrap_or(0.0);
            let right = b.get(first_metric).map(Value::numeric_or_zero).unwrap_or(0.0);
            right.total_cmp(&left)
        });
    }
    result
}

/// Per-chart view of the global processed dataset, driven by the chart's
/// frozen snapshot: summary snapshots group and sum, everything else passes
/// the rows through at row level.
pub fn chart_rows(rows: &[Record], snapshot: &DashboardConfig) -> Vec<Record> {
    if snapshot.x_axis == SUMMARY_AXIS {
        summarize(rows, snapshot)
    } else {
        rows.to_vec()
    }
}

pub fn summary_group_key(config: &DashboardConfig) -> String {
    if config.group_column.is_empty() {
        GLOBAL_GROUP.to_string()
    } else {
        config.group_column.clone()
    }
}

/// Parses repeatable `Dimension=value|value` allow-set specs.
pub fn parse_allow_filters(specs: &[String]) -> Result<HashMap<String, BTreeSet<String>>> {
    let mut filters: HashMap<String, BTreeSet<String>> = HashMap::new();
    for spec in specs {
        let (dimension, values) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("Allow filter '{spec}' must look like 'Dimension=a|b'"))?;
        let dimension = dimension.trim();
        if dimension.is_empty() {
            return Err(anyhow!("Allow filter '{spec}' is missing a dimension name"));
        }
        let entry = filters.entry(dimension.to_string()).or_default();
        entry.extend(
            values
                .split('|')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        );
    }
    Ok(filters)
}

/// `process` subcommand: clean, derive, filter, optionally summarize, and
/// write the result as CSV or an aligned table.
pub fn execute(args: &ProcessArgs) -> Result<()> {
    let dataset = io_utils::read_dataset(&args.input, args.delimiter)?;
    let sample = dataset
        .sample_row()
        .ok_or_else(|| anyhow!("{:?} contains no data rows", args.input))?;
    let mapping = infer::ColumnMap::classify(&dataset.columns, sample);
    let cleaned = clean::clean(&dataset, &mapping);

    let formulas = gather_formulas(args)?;
    let defaults = DashboardConfig::defaults_for(&mapping);
    let config = DashboardConfig {
        x_axis: if args.summary {
            SUMMARY_AXIS.to_string()
        } else {
            args.x_axis.clone().unwrap_or(defaults.x_axis)
        },
        metrics: if args.metrics.is_empty() {
            mapping
                .with_role(infer::ColumnRole::Metric)
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            split_list(&args.metrics)
        },
        group_column: args.group.clone().unwrap_or(defaults.group_column),
        formulas,
    };
    let filters = FilterState {
        date_range: (
            args.from.clone().unwrap_or_default(),
            args.to.clone().unwrap_or_default(),
        ),
        dimension_filters: parse_allow_filters(&args.allow)?,
    };

    let mut result = process(&cleaned, &config, &filters);
    let headers: Vec<String>;
    if config.is_summary() {
        result = summarize(&result, &config);
        headers = std::iter::once(summary_group_key(&config))
            .chain(config.metrics.iter().cloned())
            .collect();
    } else {
        let targets = formula::formula_targets(&config.formulas);
        headers = dataset
            .columns
            .iter()
            .cloned()
            .chain(targets.into_iter().filter(|t| !dataset.columns.contains(t)))
            .collect();
    }

    let rendered: Vec<Vec<String>> = result
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|name| row.get(name).map(Value::as_display).unwrap_or_default())
                .collect()
        })
        .collect();

    if args.table && args.output.is_none() {
        table::print_table(&headers, &rendered);
    } else {
        let mut writer = io_utils::open_csv_writer(args.output.as_deref())?;
        writer.write_record(&headers).context("Writing headers")?;
        for row in &rendered {
            writer.write_record(row).context("Writing output row")?;
        }
        writer.flush().context("Flushing output")?;
    }
    info!(
        "Processed {} row(s) from {:?} into {} output row(s)",
        dataset.len(),
        args.input,
        rendered.len()
    );
    Ok(())
}

fn gather_formulas(args: &ProcessArgs) -> Result<String> {
    let mut lines: Vec<String> = Vec::new();
    if let Some(path) = &args.formulas_file {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Reading formulas from {path:?}"))?;
        lines.extend(contents.lines().map(str::to_string));
    }
    lines.extend(args.formula.iter().cloned());
    Ok(lines.join("\n"))
}

fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
