//! End-to-end analysis of one loaded dataset.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    chat::{self, ScopedChatHook},
    config::Thresholds,
    dataset::Dataset,
    inference,
    ingest::IngestionMeta,
    insights::{self, Insight, InsightInputs},
    profiler::{self, ColumnProfile, DatasetProfile},
    ranking::{Action, RankingScheme},
    timeseries::{self, TimeSeriesResult},
    validator::{self, DatasetIssue, QualitySummary},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub ingestion: IngestionMeta,
    pub dataset: DatasetProfile,
    pub time_series: TimeSeriesResult,
    pub columns: Vec<ColumnProfile>,
    pub quality_summary: QualitySummary,
    pub insights: Vec<Insight>,
    pub ranking: RankingScheme,
    pub next_steps: Vec<Action>,
    pub scoped_chat: Vec<ScopedChatHook>,
}

impl AnalysisReport {
    /// Issues across all column profiles, in column order.
    pub fn issues(&self) -> impl Iterator<Item = &DatasetIssue> {
        self.columns.iter().flat_map(|column| column.issues.iter())
    }
}

pub fn analyze(
    dataset: &Dataset,
    ingestion: &IngestionMeta,
    thresholds: &Thresholds,
    ranking: RankingScheme,
) -> AnalysisReport {
    let issues = validator::validate_dataset(dataset, thresholds);
    let types = inference::infer_types(dataset, thresholds);
    let mut columns = profiler::profile_columns(dataset, &types, thresholds);
    let dataset_profile = profiler::profile_dataset(dataset);
    let time_series = timeseries::detect_time_series(dataset, &columns, thresholds);
    debug!(
        "Profiled {} column(s); {} issue(s); {} time-series signal(s)",
        columns.len(),
        issues.len(),
        time_series.signals.len()
    );

    let insights = insights::generate_insights(
        InsightInputs {
            dataset: &dataset_profile,
            columns: &columns,
            issues: &issues,
            time_series: &time_series,
            ingestion,
        },
        thresholds,
    );
    let strategy = ranking.strategy(thresholds.next_steps_limit);
    let next_steps = strategy.rank(&insights);
    info!(
        "Derived {} insight(s) and {} next step(s) using {} ranking",
        insights.len(),
        next_steps.len(),
        strategy.name()
    );

    let quality_summary = validator::summarize(&issues);
    attach_issues(&mut columns, issues);
    let scoped_chat = chat::chat_hooks(&insights);

    AnalysisReport {
        ingestion: *ingestion,
        dataset: dataset_profile,
        time_series,
        columns,
        quality_summary,
        insights,
        ranking,
        next_steps,
        scoped_chat,
    }
}

fn attach_issues(columns: &mut [ColumnProfile], issues: Vec<DatasetIssue>) {
    for issue in issues {
        if let Some(profile) = columns.iter_mut().find(|c| c.name == issue.column) {
            profile.issues.push(issue);
        }
    }
}
