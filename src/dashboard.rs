//! Dashboard application state.
//!
//! All mutable state lives in one explicit struct passed to and mutated by
//! its methods; there are no ambient singletons. Every mutation of the
//! dataset, configuration, formulas, or filters pushes a recomputation of
//! the memoized global processed row-set, so reads are always consistent
//! with the latest inputs.

use thiserror::Error;
use uuid::Uuid;

use crate::{
    clean,
    config::{Chart, ChartKind, DashboardConfig},
    data::{Dataset, Record},
    infer::ColumnMap,
    pipeline::{self, FilterState},
    stats::{self, MetricStats},
};

/// Configuration-precondition failures. These abort the requested action
/// with no state change; nothing here is fatal.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error("select at least one metric column before adding a chart")]
    NoMetricsSelected,
    #[error("save at least one chart before exporting")]
    NoSavedCharts,
    #[error("no chart with id {0}")]
    UnknownChart(Uuid),
}

#[derive(Debug, Default)]
pub struct Dashboard {
    dataset: Dataset,
    mapping: ColumnMap,
    config: DashboardConfig,
    filters: FilterState,
    charts: Vec<Chart>,
    processed: Vec<Record>,
}

impl Dashboard {
    pub fn new() -> Self {
        Dashboard::default()
    }

    /// Replaces the canonical dataset wholesale: classify from the first
    /// record, clean every row, and reset configuration and filters to the
    /// import defaults. Existing charts keep rendering against their frozen
    /// snapshots.
    pub fn import(&mut self, raw: Dataset) {
        let sample = raw.sample_row().cloned().unwrap_or_default();
        let mapping = ColumnMap::classify(&raw.columns, &sample);
        let rows = clean::clean(&raw, &mapping);
        self.dataset = Dataset::new(raw.columns, rows);
        self.config = DashboardConfig::defaults_for(&mapping);
        self.mapping = mapping;
        self.filters = FilterState::default();
        self.recompute();
    }

    pub fn set_config(&mut self, config: DashboardConfig) {
        self.config = config;
        self.recompute();
    }

    pub fn set_formulas(&mut self, formulas: impl Into<String>) {
        self.config.formulas = formulas.into();
        self.recompute();
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.processed = pipeline::process(&self.dataset.rows, &self.config, &self.filters);
    }

    /// Global processed dataset shared by all charts.
    pub fn processed(&self) -> &[Record] {
        &self.processed
    }

    /// Summary cards: one statistics block per configured metric.
    pub fn summary_stats(&self) -> Vec<MetricStats> {
        self.config
            .metrics
            .iter()
            .map(|metric| stats::metric_stats(&self.processed, metric))
            .collect()
    }

    /// Adds a chart with a frozen value copy of the live configuration.
    pub fn add_chart(&mut self, kind: ChartKind) -> Result<&Chart, DashboardError> {
        if self.config.metrics.is_empty() {
            return Err(DashboardError::NoMetricsSelected);
        }
        self.charts.push(Chart::new(kind, &self.config));
        Ok(self.charts.last().expect("chart just pushed"))
    }

    /// The row-set a chart renders: the global processed dataset viewed
    /// through the chart's frozen snapshot.
    pub fn chart_rows(&self, id: Uuid) -> Result<Vec<Record>, DashboardError> {
        let chart = self
            .charts
            .iter()
            .find(|chart| chart.id == id)
            .ok_or(DashboardError::UnknownChart(id))?;
        Ok(pipeline::chart_rows(&self.processed, &chart.snapshot))
    }

    pub fn set_saved(&mut self, id: Uuid, saved: bool) -> Result<(), DashboardError> {
        let chart = self
            .charts
            .iter_mut()
            .find(|chart| chart.id == id)
            .ok_or(DashboardError::UnknownChart(id))?;
        chart.is_saved = saved;
        Ok(())
    }

    pub fn remove_chart(&mut self, id: Uuid) {
        self.charts.retain(|chart| chart.id != id);
    }

    /// Charts flagged saved, in creation order. Errs when empty so the
    /// caller can surface a blocking notice instead of writing an empty
    /// document.
    pub fn export_selection(&self) -> Result<Vec<&Chart>, DashboardError> {
        let saved: Vec<&Chart> = self.charts.iter().filter(|chart| chart.is_saved).collect();
        if saved.is_empty() {
            return Err(DashboardError::NoSavedCharts);
        }
        Ok(saved)
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    pub fn mapping(&self) -> &ColumnMap {
        &self.mapping
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}
