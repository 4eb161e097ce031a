//! Insight-provider seam.
//!
//! The actual text-analysis service lives outside this crate. Callers hand
//! the provider a chart title, a short data summary, and the analysis angle;
//! any failure is swallowed into a fixed fallback string so chart rendering
//! can never break on an unavailable service.

use anyhow::Result;
use itertools::Itertools;
use log::warn;

use crate::{
    config::DescriptionKind,
    data::{Record, format_number},
    stats,
};

pub const FALLBACK_MESSAGE: &str = "Insight service is unavailable for this chart.";

pub trait InsightProvider {
    fn analyze(&self, title: &str, data_summary: &str, kind: DescriptionKind) -> Result<String>;
}

/// Analysis focus handed to the provider alongside the data summary.
pub fn focus_prompt(kind: DescriptionKind) -> &'static str {
    match kind {
        DescriptionKind::Trend => "How the metrics move and fluctuate over time.",
        DescriptionKind::Structure => "How each dimension contributes to the metric totals.",
        DescriptionKind::Ranking => "How the dimensions rank and where the weight sits.",
        DescriptionKind::Funnel => "Where the conversion process loses volume.",
    }
}

pub fn insight_or_fallback(
    provider: &dyn InsightProvider,
    title: &str,
    data_summary: &str,
    kind: DescriptionKind,
) -> String {
    match provider.analyze(title, data_summary, kind) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => FALLBACK_MESSAGE.to_string(),
        Err(err) => {
            warn!("Insight provider failed for '{title}': {err:#}");
            FALLBACK_MESSAGE.to_string()
        }
    }
}

/// Short plain-text summary of a chart's metrics, suitable as provider
/// input.
pub fn data_summary(rows: &[Record], metrics: &[String]) -> String {
    metrics
        .iter()
        .map(|metric| {
            let stats = stats::metric_stats(rows, metric);
            format!(
                "{metric}: sum {}, mean {:.2}, min {}, max {}",
                format_number(stats.sum),
                stats.mean,
                format_number(stats.min),
                format_number(stats.max)
            )
        })
        .join("; ")
}
