//! Analysis thresholds and their YAML persistence.
//!
//! Every numeric cut-off used by the pipeline lives in [`Thresholds`]. The
//! struct is passed explicitly into each stage, so alternate settings can be
//! exercised in tests without touching process-wide state. A YAML file may
//! override any subset of the fields; omitted keys keep their defaults.

use std::{fs, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    /// Validator: null ratio above which `HIGH_NULL_RATIO` is raised.
    pub null_ratio_threshold: f64,
    /// Insights: null percentage above which `HIGH_MISSINGNESS` is raised.
    pub missingness_percentage: f64,
    /// Share of the most frequent category that counts as dominance.
    pub dominance_threshold: f64,
    /// Distinct/row ratio below which a text column is categorical.
    pub categorical_ratio: f64,
    pub iqr_multiplier: f64,
    pub outlier_ratio_threshold: f64,
    pub top_values_limit: usize,
    /// Minimum share of rows that must parse as dates.
    pub date_parse_threshold: f64,
    /// Period-over-period change treated as a drop or spike.
    pub trend_change_threshold: f64,
    /// Median gap (days) at or above which rows are bucketed by month.
    pub monthly_gap_days: f64,
    pub min_trend_periods: usize,
    pub missing_periods_limit: usize,
    pub sampling_floor: f64,
    pub small_sample_rows: usize,
    pub large_sample_rows: usize,
    pub min_confidence: f64,
    pub next_steps_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            null_ratio_threshold: 0.5,
            missingness_percentage: 50.0,
            dominance_threshold: 0.8,
            categorical_ratio: 0.2,
            iqr_multiplier: 1.5,
            outlier_ratio_threshold: 0.05,
            top_values_limit: 5,
            date_parse_threshold: 0.7,
            trend_change_threshold: 0.3,
            monthly_gap_days: 25.0,
            min_trend_periods: 3,
            missing_periods_limit: 10,
            sampling_floor: 0.6,
            small_sample_rows: 1000,
            large_sample_rows: 10_000,
            min_confidence: 0.3,
            next_steps_limit: 5,
        }
    }
}

impl Thresholds {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Opening thresholds file {path:?}"))?;
        let thresholds = Self::from_yaml(&raw)
            .with_context(|| format!("Parsing thresholds file {path:?}"))?;
        Ok(thresholds)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty document means "all defaults".
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let thresholds: Thresholds = serde_yaml::from_str(raw)?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("null_ratio_threshold", self.null_ratio_threshold),
            ("dominance_threshold", self.dominance_threshold),
            ("categorical_ratio", self.categorical_ratio),
            ("outlier_ratio_threshold", self.outlier_ratio_threshold),
            ("date_parse_threshold", self.date_parse_threshold),
            ("sampling_floor", self.sampling_floor),
            ("min_confidence", self.min_confidence),
        ] {
            ensure!(
                (0.0..=1.0).contains(&value),
                "{name} must lie within [0, 1] (got {value})"
            );
        }
        ensure!(
            (0.0..=100.0).contains(&self.missingness_percentage),
            "missingness_percentage must lie within [0, 100] (got {})",
            self.missingness_percentage
        );
        ensure!(
            self.iqr_multiplier >= 0.0,
            "iqr_multiplier cannot be negative"
        );
        ensure!(
            self.trend_change_threshold > 0.0,
            "trend_change_threshold must be positive"
        );
        ensure!(
            self.monthly_gap_days > 0.0,
            "monthly_gap_days must be positive"
        );
        ensure!(
            self.min_trend_periods >= 2,
            "min_trend_periods must be at least 2"
        );
        ensure!(
            self.small_sample_rows <= self.large_sample_rows,
            "small_sample_rows cannot exceed large_sample_rows"
        );
        for (name, value) in [
            ("top_values_limit", self.top_values_limit),
            ("missing_periods_limit", self.missing_periods_limit),
            ("next_steps_limit", self.next_steps_limit),
        ] {
            ensure!(value > 0, "{name} must be greater than zero");
        }
        Ok(())
    }
}
