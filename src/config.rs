//! Dashboard configuration and chart snapshots.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::infer::{ColumnMap, ColumnRole};

/// X-axis sentinel selecting group-and-sum mode instead of a real column.
pub const SUMMARY_AXIS: &str = "SUMMARY";

/// Live dashboard configuration; charts freeze a value copy of this at
/// creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub x_axis: String,
    pub metrics: Vec<String>,
    pub group_column: String,
    pub formulas: String,
}

impl DashboardConfig {
    /// Starting configuration after an import: the first Time column as the
    /// x-axis, the first two Metric columns, and the first Dimension column
    /// as the grouping candidate.
    pub fn defaults_for(mapping: &ColumnMap) -> Self {
        let x_axis = mapping
            .with_role(ColumnRole::Time)
            .first()
            .map(|name| name.to_string())
            .unwrap_or_default();
        let metrics = mapping
            .with_role(ColumnRole::Metric)
            .into_iter()
            .take(2)
            .map(str::to_string)
            .collect();
        let group_column = mapping
            .with_role(ColumnRole::Dimension)
            .first()
            .map(|name| name.to_string())
            .unwrap_or_default();
        DashboardConfig {
            x_axis,
            metrics,
            group_column,
            formulas: String::new(),
        }
    }

    pub fn is_summary(&self) -> bool {
        self.x_axis == SUMMARY_AXIS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    MetricCard,
    Line,
    Bar,
    Pie,
    Area,
    Funnel,
    Table,
    Waterfall,
    Ranking,
}

/// Analysis angle handed to the insight collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    Trend,
    Structure,
    Ranking,
    Funnel,
}

impl DescriptionKind {
    /// Chart kind wins over metric-name keywords. Keywords match whole
    /// words only, so "Laptop Sales" never reads as a "top" ranking.
    /// The default reading is a trend over time.
    pub fn derive(kind: ChartKind, metrics: &[String]) -> Self {
        if kind == ChartKind::Pie || has_keyword(metrics, &["share", "contribution"]) {
            DescriptionKind::Structure
        } else if kind == ChartKind::Ranking || has_keyword(metrics, &["rank", "ranking", "top"]) {
            DescriptionKind::Ranking
        } else if kind == ChartKind::Funnel {
            DescriptionKind::Funnel
        } else {
            DescriptionKind::Trend
        }
    }
}

fn has_keyword(metrics: &[String], keywords: &[&str]) -> bool {
    metrics
        .iter()
        .flat_map(|metric| metric.split(|c: char| !c.is_ascii_alphanumeric()))
        .any(|token| keywords.iter().any(|k| token.eq_ignore_ascii_case(k)))
}

/// A chart widget. `snapshot` is a deep value copy of the configuration at
/// creation time: the chart never re-reads the live configuration, so its
/// visual definition stays stable while the user keeps editing global
/// settings for new charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: Uuid,
    pub kind: ChartKind,
    pub title: String,
    pub snapshot: DashboardConfig,
    pub is_saved: bool,
    pub description: DescriptionKind,
}

impl Chart {
    pub fn new(kind: ChartKind, config: &DashboardConfig) -> Self {
        let title = default_title(kind, &config.metrics);
        Chart {
            id: Uuid::new_v4(),
            kind,
            title,
            snapshot: config.clone(),
            is_saved: false,
            description: DescriptionKind::derive(kind, &config.metrics),
        }
    }
}

fn default_title(kind: ChartKind, metrics: &[String]) -> String {
    match kind {
        ChartKind::MetricCard => format!("{} totals", metrics.join(" + ")),
        _ => format!("{} analysis", metrics.join(" & ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::infer::ColumnMap;

    #[test]
    fn defaults_pick_time_two_metrics_and_a_dimension() {
        let columns = vec![
            "day".to_string(),
            "revenue".to_string(),
            "cost".to_string(),
            "units".to_string(),
            "region".to_string(),
        ];
        let sample: crate::data::Record = [
            ("day".to_string(), Value::Text("2024-01-01".into())),
            ("revenue".to_string(), Value::Number(10.0)),
            ("cost".to_string(), Value::Number(4.0)),
            ("units".to_string(), Value::Number(2.0)),
            ("region".to_string(), Value::Text("North".into())),
        ]
        .into_iter()
        .collect();
        let mapping = ColumnMap::classify(&columns, &sample);
        let config = DashboardConfig::defaults_for(&mapping);
        assert_eq!(config.x_axis, "day");
        assert_eq!(config.metrics, vec!["revenue", "cost"]);
        assert_eq!(config.group_column, "region");
    }

    #[test]
    fn description_kind_follows_chart_kind_then_keywords() {
        assert_eq!(
            DescriptionKind::derive(ChartKind::Pie, &[]),
            DescriptionKind::Structure
        );
        assert_eq!(
            DescriptionKind::derive(ChartKind::Funnel, &[]),
            DescriptionKind::Funnel
        );
        assert_eq!(
            DescriptionKind::derive(ChartKind::Bar, &["Top Sellers".to_string()]),
            DescriptionKind::Ranking
        );
        assert_eq!(
            DescriptionKind::derive(ChartKind::Line, &["Revenue".to_string()]),
            DescriptionKind::Trend
        );
    }

    #[test]
    fn keyword_matching_ignores_embedded_substrings() {
        assert_eq!(
            DescriptionKind::derive(ChartKind::Bar, &["Laptop Sales".to_string()]),
            DescriptionKind::Trend
        );
        assert_eq!(
            DescriptionKind::derive(ChartKind::Bar, &["Bus Stop Count".to_string()]),
            DescriptionKind::Trend
        );
        assert_eq!(
            DescriptionKind::derive(ChartKind::Bar, &["Top 10 Products".to_string()]),
            DescriptionKind::Ranking
        );
    }
}
