//! Rule-based dataset quality scan.
//!
//! The validator works from the raw dataset alone and never reads profiler
//! output. Each rule is evaluated per column in dataset order, and a column
//! may raise several issues.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::Thresholds,
    dataset::{Column, Dataset},
    stats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Critical,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssueSeverity::Warning => "warning",
            IssueSeverity::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    HighNullRatio,
    ConstantColumn,
    ExtremeOutliers,
    CategoryDominance,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::HighNullRatio => "HIGH_NULL_RATIO",
            IssueCode::ConstantColumn => "CONSTANT_COLUMN",
            IssueCode::ExtremeOutliers => "EXTREME_OUTLIERS",
            IssueCode::CategoryDominance => "CATEGORY_DOMINANCE",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetIssue {
    pub severity: IssueSeverity,
    pub code: IssueCode,
    pub message: String,
    pub column: String,
}

impl DatasetIssue {
    fn warning(code: IssueCode, column: &Column, message: String) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            code,
            message,
            column: column.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub critical_issues: usize,
    pub warnings: usize,
}

pub fn validate_dataset(dataset: &Dataset, thresholds: &Thresholds) -> Vec<DatasetIssue> {
    let issues = dataset
        .columns()
        .iter()
        .flat_map(|column| validate_column(column, thresholds))
        .collect::<Vec<_>>();
    debug!(
        "Validator raised {} issue(s) across {} column(s)",
        issues.len(),
        dataset.column_count()
    );
    issues
}

pub fn validate_column(column: &Column, thresholds: &Thresholds) -> Vec<DatasetIssue> {
    let mut issues = Vec::new();
    let name = column.name();

    let null_ratio = column.null_ratio();
    if null_ratio > thresholds.null_ratio_threshold {
        issues.push(DatasetIssue::warning(
            IssueCode::HighNullRatio,
            column,
            format!(
                "Column '{name}' has {} missing values",
                stats::format_percent(null_ratio)
            ),
        ));
    }

    if column.distinct_count() <= 1 {
        issues.push(DatasetIssue::warning(
            IssueCode::ConstantColumn,
            column,
            format!("Column '{name}' has constant or near-constant values"),
        ));
    }

    if column.is_numeric() {
        let values = column.numeric_values();
        if let Some(bounds) = stats::iqr_bounds(&values, thresholds.iqr_multiplier) {
            let outlier_ratio = stats::ratio(bounds.count_outliers(&values), values.len());
            if outlier_ratio > thresholds.outlier_ratio_threshold {
                issues.push(DatasetIssue::warning(
                    IssueCode::ExtremeOutliers,
                    column,
                    format!(
                        "Column '{name}' has {} values outside IQR bounds",
                        stats::format_percent(outlier_ratio)
                    ),
                ));
            }
        }
    }

    if column.is_text() {
        let counts = column.value_counts();
        if let Some((_, top)) = counts.first() {
            let total = counts.iter().map(|(_, count)| *count).sum::<usize>();
            let dominant_ratio = stats::ratio(*top, total);
            if dominant_ratio > thresholds.dominance_threshold {
                issues.push(DatasetIssue::warning(
                    IssueCode::CategoryDominance,
                    column,
                    format!(
                        "Column '{name}' is dominated by a single category ({})",
                        stats::format_percent(dominant_ratio)
                    ),
                ));
            }
        }
    }

    issues
}

pub fn summarize(issues: &[DatasetIssue]) -> QualitySummary {
    issues
        .iter()
        .fold(QualitySummary::default(), |mut summary, issue| {
            match issue.severity {
                IssueSeverity::Warning => summary.warnings += 1,
                IssueSeverity::Critical => summary.critical_issues += 1,
            }
            summary
        })
}
