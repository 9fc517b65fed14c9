//! Turning insights into ranked next steps.
//!
//! Two strategies share the [`RankingStrategy`] interface:
//!
//! - [`PriorityTable`]: severity base priority plus a fixed bonus per finding
//!   code, deduplicated and capped.
//! - [`WeightedConfidence`]: severity weight scaled by the insight's
//!   confidence score, with richer action records and no cap.
//!
//! Callers pick one through [`RankingScheme`].

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    findings::{FindingCode, Severity},
    insights::Insight,
    stats,
};

pub const DEFAULT_NEXT_STEPS_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub title: String,
    pub description: String,
    pub priority: f64,
    pub derived_from: FindingCode,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub why_now: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub risk_if_ignored: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub confidence: Option<f64>,
}

pub trait RankingStrategy {
    fn name(&self) -> &'static str;

    /// Ranked actions, highest priority first. Equal priorities keep the
    /// order in which their insights appeared.
    fn rank(&self, insights: &[Insight]) -> Vec<Action>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum RankingScheme {
    #[default]
    PriorityTable,
    Weighted,
}

impl RankingScheme {
    pub fn strategy(self, limit: usize) -> Box<dyn RankingStrategy> {
        match self {
            RankingScheme::PriorityTable => Box::new(PriorityTable::new(limit)),
            RankingScheme::Weighted => Box::new(WeightedConfidence),
        }
    }
}

impl fmt::Display for RankingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RankingScheme::PriorityTable => "priority-table",
            RankingScheme::Weighted => "weighted",
        })
    }
}

fn sort_by_priority_desc(actions: &mut [Action]) {
    actions.sort_by(|a, b| b.priority.total_cmp(&a.priority));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityTable {
    limit: usize,
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self::new(DEFAULT_NEXT_STEPS_LIMIT)
    }
}

struct TableEntry {
    bonus: u32,
    title: &'static str,
    description: &'static str,
    category: &'static str,
}

impl PriorityTable {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn base_priority(severity: Severity) -> u32 {
        match severity {
            Severity::High => 90,
            Severity::Medium => 60,
            Severity::Low => 30,
        }
    }

    fn entry(code: FindingCode) -> Option<TableEntry> {
        let entry = match code {
            FindingCode::MissingPeriods => TableEntry {
                bonus: 15,
                title: "Fix missing time periods",
                description: "Detected gaps in the time series can invalidate trend analysis, \
                              seasonality detection, and forecasting.",
                category: "DATA_INTEGRITY",
            },
            FindingCode::SuddenDrop => TableEntry {
                bonus: 20,
                title: "Investigate sudden data drop",
                description: "Abrupt drops may indicate system failures, reporting gaps, \
                              or real-world disruptions that require validation.",
                category: "ANOMALY_INVESTIGATION",
            },
            FindingCode::HighMissingness => TableEntry {
                bonus: 10,
                title: "Address high missing values",
                description: "High missingness reduces analytical confidence and may bias results.",
                category: "DATA_QUALITY",
            },
            FindingCode::CategoryDominance => TableEntry {
                bonus: 5,
                title: "Rebalance dominant categories",
                description: "Overrepresented categories can skew patterns and predictions.",
                category: "DATA_DISTRIBUTION",
            },
            FindingCode::DataQualityIssues | FindingCode::SuddenSpike => return None,
        };
        Some(entry)
    }
}

impl RankingStrategy for PriorityTable {
    fn name(&self) -> &'static str {
        "priority-table"
    }

    fn rank(&self, insights: &[Insight]) -> Vec<Action> {
        let mut steps: Vec<Action> = Vec::new();
        for insight in insights {
            let code = insight.code();
            let Some(entry) = Self::entry(code) else {
                continue;
            };
            let step = Action {
                title: entry.title.to_string(),
                description: entry.description.to_string(),
                priority: f64::from(Self::base_priority(insight.severity()) + entry.bonus),
                derived_from: code,
                category: entry.category.to_string(),
                why_now: None,
                risk_if_ignored: None,
                confidence: None,
            };
            // First occurrence of a (code, title) key keeps its slot; the
            // latest step replaces its contents.
            match steps
                .iter_mut()
                .find(|existing| existing.derived_from == code && existing.title == step.title)
            {
                Some(existing) => *existing = step,
                None => steps.push(step),
            }
        }
        sort_by_priority_desc(&mut steps);
        steps.truncate(self.limit);
        steps
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeightedConfidence;

struct ActionTemplate {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    why_now: &'static str,
    risk_if_ignored: &'static str,
}

impl WeightedConfidence {
    pub fn severity_weight(severity: Severity) -> f64 {
        match severity {
            Severity::High => 3.0,
            Severity::Medium => 2.0,
            Severity::Low => 1.0,
        }
    }

    fn template(code: FindingCode) -> Option<ActionTemplate> {
        let template = match code {
            FindingCode::HighMissingness => ActionTemplate {
                title: "Fix or remove high-missing columns",
                description: "Columns with excessive missing data reduce reliability of \
                              analysis, modeling, and reporting.",
                category: "data_quality",
                why_now: "Missing values directly impact statistical validity.",
                risk_if_ignored: "Models may learn biased patterns or fail silently due to \
                                  incomplete data.",
            },
            FindingCode::CategoryDominance => ActionTemplate {
                title: "Audit dominant categories",
                description: "A single category dominates the dataset, limiting signal diversity.",
                category: "distribution_risk",
                why_now: "Dominant categories can hide minority behaviors.",
                risk_if_ignored: "Decisions may overfit to one segment and miss emerging risks.",
            },
            FindingCode::SuddenDrop => ActionTemplate {
                title: "Investigate sudden activity drop",
                description: "Abrupt drops often indicate data loss, system failures, or \
                              real-world disruption.",
                category: "trend_risk",
                why_now: "Sudden declines are rarely normal in stable systems.",
                risk_if_ignored: "Forecasts and operational decisions may become misleading.",
            },
            FindingCode::SuddenSpike => ActionTemplate {
                title: "Validate spike authenticity",
                description: "Spikes may be anomalies, one-off events, or ingestion errors.",
                category: "trend_signal",
                why_now: "Unverified spikes can distort averages and trends.",
                risk_if_ignored: "False positives may trigger incorrect business responses.",
            },
            FindingCode::MissingPeriods => ActionTemplate {
                title: "Backfill or flag missing periods",
                description: "Gaps in time-series data distort trend analysis and forecasting.",
                category: "time_series_integrity",
                why_now: "Time gaps break continuity assumptions.",
                risk_if_ignored: "Trend-based decisions may be inaccurate or misleading.",
            },
            FindingCode::DataQualityIssues => return None,
        };
        Some(template)
    }
}

impl RankingStrategy for WeightedConfidence {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn rank(&self, insights: &[Insight]) -> Vec<Action> {
        let mut actions = insights
            .iter()
            .filter_map(|insight| {
                let template = Self::template(insight.code())?;
                let confidence = insight.confidence.score;
                Some(Action {
                    title: template.title.to_string(),
                    description: template.description.to_string(),
                    priority: stats::round_to(
                        Self::severity_weight(insight.severity()) * confidence,
                        2,
                    ),
                    derived_from: insight.code(),
                    category: template.category.to_string(),
                    why_now: Some(template.why_now.to_string()),
                    risk_if_ignored: Some(template.risk_if_ignored.to_string()),
                    confidence: Some(confidence),
                })
            })
            .collect::<Vec<_>>();
        sort_by_priority_desc(&mut actions);
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        confidence::{ConfidenceLabel, ConfidenceScore},
        findings::{Finding, FindingType},
    };

    fn insight(code: FindingCode, severity: Severity, score: f64) -> Insight {
        Insight {
            finding: Finding::new(FindingType::Risk, code, severity, code.as_str()),
            confidence: ConfidenceScore {
                score,
                label: ConfidenceLabel::Medium,
                factors: Vec::new(),
            },
        }
    }

    #[test]
    fn priority_table_adds_code_bonus_to_severity_base() {
        let insights = vec![
            insight(FindingCode::HighMissingness, Severity::Medium, 0.63),
            insight(FindingCode::SuddenDrop, Severity::High, 0.7),
            insight(FindingCode::CategoryDominance, Severity::High, 0.7),
        ];
        let steps = PriorityTable::default().rank(&insights);
        let summary = steps
            .iter()
            .map(|s| (s.derived_from, s.priority))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (FindingCode::SuddenDrop, 110.0),
                (FindingCode::CategoryDominance, 95.0),
                (FindingCode::HighMissingness, 70.0),
            ]
        );
        assert_eq!(steps[0].category, "ANOMALY_INVESTIGATION");
        assert!(steps.iter().all(|s| s.why_now.is_none()));
    }

    #[test]
    fn priority_table_skips_codes_without_entries() {
        let insights = vec![
            insight(FindingCode::DataQualityIssues, Severity::Medium, 0.63),
            insight(FindingCode::SuddenSpike, Severity::Medium, 0.63),
        ];
        assert!(PriorityTable::default().rank(&insights).is_empty());
    }

    #[test]
    fn priority_table_dedupes_keeping_first_slot_and_last_value() {
        let insights = vec![
            insight(FindingCode::HighMissingness, Severity::High, 0.7),
            insight(FindingCode::CategoryDominance, Severity::Low, 0.56),
            insight(FindingCode::HighMissingness, Severity::Low, 0.56),
        ];
        let steps = PriorityTable::default().rank(&insights);
        let summary = steps
            .iter()
            .map(|s| (s.derived_from, s.priority))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (FindingCode::HighMissingness, 40.0),
                (FindingCode::CategoryDominance, 35.0),
            ]
        );
    }

    #[test]
    fn priority_table_sorts_descending_and_caps() {
        let insights = vec![
            insight(FindingCode::CategoryDominance, Severity::Medium, 0.6),
            insight(FindingCode::HighMissingness, Severity::Low, 0.6),
            insight(FindingCode::MissingPeriods, Severity::Low, 0.6),
            insight(FindingCode::SuddenDrop, Severity::Low, 0.6),
        ];
        let steps = PriorityTable::new(3).rank(&insights);
        let summary = steps
            .iter()
            .map(|s| (s.derived_from, s.priority))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (FindingCode::CategoryDominance, 65.0),
                (FindingCode::SuddenDrop, 50.0),
                (FindingCode::MissingPeriods, 45.0),
            ]
        );
    }

    #[test]
    fn equal_priorities_keep_first_seen_order() {
        let step = |code: FindingCode, priority: f64| Action {
            title: code.as_str().to_string(),
            description: String::new(),
            priority,
            derived_from: code,
            category: String::new(),
            why_now: None,
            risk_if_ignored: None,
            confidence: None,
        };
        let mut steps = vec![
            step(FindingCode::MissingPeriods, 65.0),
            step(FindingCode::SuddenDrop, 80.0),
            step(FindingCode::CategoryDominance, 65.0),
            step(FindingCode::HighMissingness, 65.0),
        ];
        sort_by_priority_desc(&mut steps);
        let order = steps.iter().map(|s| s.derived_from).collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                FindingCode::SuddenDrop,
                FindingCode::MissingPeriods,
                FindingCode::CategoryDominance,
                FindingCode::HighMissingness,
            ]
        );
    }

    #[test]
    fn priority_table_totals_never_collide_across_codes() {
        let codes = [
            FindingCode::MissingPeriods,
            FindingCode::SuddenDrop,
            FindingCode::HighMissingness,
            FindingCode::CategoryDominance,
        ];
        let severities = [Severity::High, Severity::Medium, Severity::Low];
        let insights = codes
            .iter()
            .flat_map(|code| severities.iter().map(move |s| insight(*code, *s, 0.7)))
            .collect::<Vec<_>>();
        let totals = insights
            .iter()
            .map(|i| PriorityTable::new(1).rank(std::slice::from_ref(i))[0].priority as u32)
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(totals.len(), insights.len());
    }

    #[test]
    fn weighted_scales_severity_by_confidence() {
        let insights = vec![
            insight(FindingCode::HighMissingness, Severity::Medium, 0.63),
            insight(FindingCode::SuddenSpike, Severity::Medium, 0.63),
            insight(FindingCode::CategoryDominance, Severity::High, 0.7),
            insight(FindingCode::DataQualityIssues, Severity::Medium, 0.63),
        ];
        let actions = WeightedConfidence.rank(&insights);
        let summary = actions
            .iter()
            .map(|a| (a.derived_from, a.priority))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                (FindingCode::CategoryDominance, 2.1),
                (FindingCode::HighMissingness, 1.26),
                (FindingCode::SuddenSpike, 1.26),
            ]
        );
        assert_eq!(actions[0].category, "distribution_risk");
        assert_eq!(actions[0].confidence, Some(0.7));
        assert_eq!(
            actions[2].why_now.as_deref(),
            Some("Unverified spikes can distort averages and trends.")
        );
    }

    #[test]
    fn weighted_list_is_unbounded() {
        let insights = (0..8)
            .map(|_| insight(FindingCode::SuddenDrop, Severity::High, 1.0))
            .collect::<Vec<_>>();
        assert_eq!(WeightedConfidence.rank(&insights).len(), 8);
    }

    #[test]
    fn scheme_selects_strategy() {
        assert_eq!(RankingScheme::default().strategy(5).name(), "priority-table");
        assert_eq!(RankingScheme::Weighted.strategy(5).name(), "weighted");
        assert_eq!(
            RankingScheme::from_str("priority-table", false).unwrap(),
            RankingScheme::PriorityTable
        );
    }

    #[test]
    fn priority_table_actions_omit_weighted_fields_in_json() {
        let steps =
            PriorityTable::default().rank(&[insight(FindingCode::SuddenDrop, Severity::High, 0.7)]);
        let json = serde_json::to_value(&steps[0]).unwrap();
        assert_eq!(json["derived_from"], "SUDDEN_DROP");
        assert!(json.get("why_now").is_none());
        assert!(json.get("confidence").is_none());
    }
}
