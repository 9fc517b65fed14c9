//! Insight generation: merges profiler, validator, and time-series output
//! into one confidence-scored list ordered by severity.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    confidence::{ConfidenceScore, compute_confidence},
    config::Thresholds,
    findings::{Finding, FindingCode, FindingType, Severity},
    ingest::IngestionMeta,
    profiler::{ColumnProfile, DatasetProfile},
    timeseries::TimeSeriesResult,
    validator::DatasetIssue,
};

const TEMPORAL_RECOMMENDATION: &str = "Investigate root causes for temporal anomalies.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(flatten)]
    pub finding: Finding,
    pub confidence: ConfidenceScore,
}

impl Insight {
    pub fn code(&self) -> FindingCode {
        self.finding.code
    }

    pub fn severity(&self) -> Severity {
        self.finding.severity
    }
}

/// Everything the generator reads, borrowed from one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    pub dataset: &'a DatasetProfile,
    pub columns: &'a [ColumnProfile],
    pub issues: &'a [DatasetIssue],
    pub time_series: &'a TimeSeriesResult,
    pub ingestion: &'a IngestionMeta,
}

pub fn generate_insights(inputs: InsightInputs<'_>, thresholds: &Thresholds) -> Vec<Insight> {
    let mut findings = Vec::new();
    findings.extend(missingness_findings(inputs.columns, thresholds));
    findings.extend(dominance_findings(inputs.columns, thresholds));
    findings.extend(quality_summary_finding(inputs.issues));
    findings.extend(temporal_findings(inputs.time_series));

    let mut insights = findings
        .into_iter()
        .map(|finding| {
            let confidence =
                compute_confidence(&finding, inputs.ingestion, inputs.dataset, thresholds);
            Insight {
                finding,
                confidence,
            }
        })
        .collect::<Vec<_>>();
    sort_by_severity(&mut insights);
    debug!("Generated {} insight(s)", insights.len());
    insights
}

/// Stable: insights of equal severity keep their generation order.
pub fn sort_by_severity(insights: &mut [Insight]) {
    insights.sort_by_key(|insight| insight.severity().rank());
}

fn missingness_findings<'a>(
    columns: &'a [ColumnProfile],
    thresholds: &'a Thresholds,
) -> impl Iterator<Item = Finding> + 'a {
    columns
        .iter()
        .filter(move |column| column.metrics.null_percentage > thresholds.missingness_percentage)
        .map(|column| {
            Finding::new(
                FindingType::Risk,
                FindingCode::HighMissingness,
                Severity::Medium,
                format!("Column '{}' has very high missing values.", column.name),
            )
            .with_evidence(format!(
                "null_percentage = {:.1}%",
                column.metrics.null_percentage
            ))
            .with_impact("Decisions using this column may be unreliable.")
            .with_recommendation("Exclude this column or fix upstream data collection.")
        })
}

fn dominance_findings<'a>(
    columns: &'a [ColumnProfile],
    thresholds: &'a Thresholds,
) -> impl Iterator<Item = Finding> + 'a {
    columns.iter().filter_map(move |column| {
        let stats = column.metrics.categorical()?;
        (stats.dominant_ratio > thresholds.dominance_threshold).then(|| {
            Finding::new(
                FindingType::Risk,
                FindingCode::CategoryDominance,
                Severity::High,
                format!("Column '{}' is dominated by a single category.", column.name),
            )
            .with_evidence(format!("dominant_ratio = {:.2}", stats.dominant_ratio))
            .with_impact("Business outcomes may be overly dependent on a single segment.")
            .with_recommendation("Investigate diversification or segment-specific risks.")
        })
    })
}

fn quality_summary_finding(issues: &[DatasetIssue]) -> Option<Finding> {
    if issues.is_empty() {
        return None;
    }
    Some(
        Finding::new(
            FindingType::Warning,
            FindingCode::DataQualityIssues,
            Severity::Medium,
            "Dataset contains multiple quality warnings.",
        )
        .with_evidence(format!("warnings_count = {}", issues.len()))
        .with_impact("Insights may be affected by underlying data issues.")
        .with_recommendation("Review data quality warnings before making decisions."),
    )
}

fn temporal_findings(time_series: &TimeSeriesResult) -> impl Iterator<Item = Finding> + '_ {
    time_series.signals.iter().map(|signal| Finding {
        recommendation: Some(TEMPORAL_RECOMMENDATION.to_string()),
        ..signal.clone()
    })
}
