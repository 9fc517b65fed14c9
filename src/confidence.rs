//! Explainable confidence scoring for individual findings.
//!
//! The score starts at 1.0 and is scaled down by sampling, small datasets,
//! and weaker severities. Each adjustment leaves a factor tag behind, in the
//! order it was applied, so the final number can be traced back.

use serde::{Deserialize, Serialize};

use crate::{
    config::Thresholds,
    findings::{Finding, Severity},
    ingest::IngestionMeta,
    profiler::DatasetProfile,
    stats,
};

const MEDIUM_SEVERITY_WEIGHT: f64 = 0.9;
const LOW_SEVERITY_WEIGHT: f64 = 0.8;
const SMALL_SAMPLE_WEIGHT: f64 = 0.7;
const HIGH_LABEL_CUTOFF: f64 = 0.8;
const MEDIUM_LABEL_CUTOFF: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLabel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceFactor {
    SampledData,
    FullData,
    SmallSample,
    LargeSample,
    StrongSignal,
    ModerateSignal,
    WeakSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub score: f64,
    pub label: ConfidenceLabel,
    pub factors: Vec<ConfidenceFactor>,
}

pub fn compute_confidence(
    finding: &Finding,
    ingestion: &IngestionMeta,
    dataset: &DatasetProfile,
    thresholds: &Thresholds,
) -> ConfidenceScore {
    let mut score = 1.0_f64;
    let mut factors = Vec::with_capacity(3);

    if ingestion.sampled {
        score *= (thresholds.sampling_floor + ingestion.sampling_ratio).min(1.0);
        factors.push(ConfidenceFactor::SampledData);
    } else {
        factors.push(ConfidenceFactor::FullData);
    }

    if dataset.rows_analyzed < thresholds.small_sample_rows {
        score *= SMALL_SAMPLE_WEIGHT;
        factors.push(ConfidenceFactor::SmallSample);
    } else if dataset.rows_analyzed > thresholds.large_sample_rows {
        factors.push(ConfidenceFactor::LargeSample);
    }

    match finding.severity {
        Severity::High => factors.push(ConfidenceFactor::StrongSignal),
        Severity::Medium => {
            score *= MEDIUM_SEVERITY_WEIGHT;
            factors.push(ConfidenceFactor::ModerateSignal);
        }
        Severity::Low => {
            score *= LOW_SEVERITY_WEIGHT;
            factors.push(ConfidenceFactor::WeakSignal);
        }
    }

    let score = score.clamp(thresholds.min_confidence, 1.0);
    // The label reads the clamped score before rounding.
    let label = if score >= HIGH_LABEL_CUTOFF {
        ConfidenceLabel::High
    } else if score >= MEDIUM_LABEL_CUTOFF {
        ConfidenceLabel::Medium
    } else {
        ConfidenceLabel::Low
    };

    ConfidenceScore {
        score: stats::round_to(score, 2),
        label,
        factors,
    }
}
