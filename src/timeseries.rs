//! Time-series detection over a parsed date column.
//!
//! The first text column that mostly parses as dates becomes the time axis.
//! Rows are bucketed per calendar day or month (chosen from the median gap
//! between successive timestamps), and the per-period row counts are scanned
//! for sudden drops, sudden spikes, and calendar gaps.

use std::{collections::HashSet, fmt};

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::Thresholds,
    dataset::{Column, ColumnValues, Dataset, parse_datetime_token},
    findings::{Finding, FindingCode, FindingType, Severity},
    profiler::ColumnProfile,
    stats,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Monthly,
}

impl Frequency {
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Frequency::Daily => date.format("%Y-%m-%d").to_string(),
            Frequency::Monthly => date.format("%Y-%m").to_string(),
        }
    }

    /// Every bucket start between `first` and `last`, inclusive.
    fn calendar(&self, first: NaiveDate, last: NaiveDate) -> Box<dyn Iterator<Item = NaiveDate>> {
        match self {
            Frequency::Daily => Box::new(first.iter_days().take_while(move |d| *d <= last)),
            Frequency::Monthly => {
                let start = first.with_day(1).unwrap_or(first);
                let end = last.with_day(1).unwrap_or(last);
                Box::new(
                    std::iter::successors(Some(start), |d| d.checked_add_months(Months::new(1)))
                        .take_while(move |d| *d <= end),
                )
            }
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => f.write_str("daily"),
            Frequency::Monthly => f.write_str("monthly"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCount {
    pub period: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesResult {
    pub date_column: Option<String>,
    pub frequency: Option<Frequency>,
    pub series: Vec<PeriodCount>,
    pub signals: Vec<Finding>,
}

pub fn detect_time_series(
    dataset: &Dataset,
    profiles: &[ColumnProfile],
    thresholds: &Thresholds,
) -> TimeSeriesResult {
    let accepted = profiles
        .iter()
        .filter(|profile| profile.metrics.inferred_type.is_textual())
        .filter_map(|profile| dataset.column(&profile.name))
        .find_map(|column| {
            accept_date_column(column, dataset.row_count(), thresholds)
                .map(|dates| (column.name().to_string(), dates))
        });
    let Some((date_column, parsed)) = accepted else {
        debug!("No column parsed as dates often enough for trend analysis");
        return TimeSeriesResult::default();
    };

    let mut dates = parsed.into_iter().flatten().collect::<Vec<_>>();
    if dates.is_empty() {
        return TimeSeriesResult::default();
    }
    dates.sort();

    let frequency = infer_frequency(&dates, thresholds);
    debug!("Using '{date_column}' as {frequency} time axis over {} row(s)", dates.len());
    let mut result = TimeSeriesResult {
        date_column: Some(date_column),
        frequency: Some(frequency),
        ..TimeSeriesResult::default()
    };

    let series = aggregate_periods(&dates, frequency);
    if series.len() < thresholds.min_trend_periods {
        return result;
    }

    result.signals = trend_signals(&series, thresholds);
    if let (Some(first), Some(last)) = (dates.first(), dates.last())
        && let Some(signal) =
            missing_period_signal(first.date(), last.date(), &series, frequency, thresholds)
    {
        result.signals.push(signal);
    }
    result.series = series;
    result
}

/// Parsed cells when the success share reaches the date threshold. An
/// accepted column may still hold no parseable cell when the threshold is 0.
pub fn accept_date_column(
    column: &Column,
    row_count: usize,
    thresholds: &Thresholds,
) -> Option<Vec<Option<NaiveDateTime>>> {
    let parsed = parse_dates(column);
    let successes = parsed.iter().filter(|d| d.is_some()).count();
    let success_ratio = stats::ratio(successes, row_count);
    (success_ratio >= thresholds.date_parse_threshold).then_some(parsed)
}

/// Date candidates are textual columns, which are always stored as text;
/// any other storage parses to nothing.
pub fn parse_dates(column: &Column) -> Vec<Option<NaiveDateTime>> {
    match column.values() {
        ColumnValues::Text(values) => values
            .iter()
            .map(|cell| cell.as_deref().and_then(parse_datetime_token))
            .collect(),
        _ => vec![None; column.len()],
    }
}

/// Monthly when the median whole-day gap between sorted timestamps reaches
/// `monthly_gap_days`, daily otherwise (including a single timestamp).
pub fn infer_frequency(sorted_dates: &[NaiveDateTime], thresholds: &Thresholds) -> Frequency {
    let gaps = sorted_dates
        .iter()
        .tuple_windows()
        .map(|(a, b)| (*b - *a).num_days() as f64)
        .collect::<Vec<_>>();
    match stats::median(&gaps) {
        Some(gap) if gap >= thresholds.monthly_gap_days => Frequency::Monthly,
        _ => Frequency::Daily,
    }
}

/// Row counts per bucket; `sorted_dates` must be ascending.
pub fn aggregate_periods(sorted_dates: &[NaiveDateTime], frequency: Frequency) -> Vec<PeriodCount> {
    let buckets = sorted_dates
        .iter()
        .chunk_by(|dt| frequency.label(dt.date()));
    let series = buckets
        .into_iter()
        .map(|(period, rows)| PeriodCount {
            period,
            count: rows.count(),
        })
        .collect();
    series
}

/// Period-over-period drops and spikes; the first period has no baseline.
pub fn trend_signals(series: &[PeriodCount], thresholds: &Thresholds) -> Vec<Finding> {
    let threshold = thresholds.trend_change_threshold;
    series
        .iter()
        .tuple_windows()
        .filter_map(|(previous, current)| {
            if previous.count == 0 {
                return None;
            }
            let change = (current.count as f64 - previous.count as f64) / previous.count as f64;
            let period = current.period.as_str();
            if change <= -threshold {
                Some(
                    Finding::new(
                        FindingType::Risk,
                        FindingCode::SuddenDrop,
                        Severity::High,
                        format!("Sudden drop detected in period {period}."),
                    )
                    .with_evidence(format!("change = {}", stats::format_percent(change)))
                    .with_impact("Business activity may have declined sharply.")
                    .with_period(period),
                )
            } else if change >= threshold {
                Some(
                    Finding::new(
                        FindingType::Signal,
                        FindingCode::SuddenSpike,
                        Severity::Medium,
                        format!("Sudden spike detected in period {period}."),
                    )
                    .with_evidence(format!("change = +{}", stats::format_percent(change)))
                    .with_impact("Business activity may have spiked unusually.")
                    .with_period(period),
                )
            } else {
                None
            }
        })
        .collect()
}

pub fn missing_period_signal(
    first: NaiveDate,
    last: NaiveDate,
    series: &[PeriodCount],
    frequency: Frequency,
    thresholds: &Thresholds,
) -> Option<Finding> {
    let observed = series
        .iter()
        .map(|p| p.period.as_str())
        .collect::<HashSet<_>>();
    let mut missing_count = 0usize;
    let mut listed = Vec::new();
    for bucket in frequency.calendar(first, last) {
        let label = frequency.label(bucket);
        if observed.contains(label.as_str()) {
            continue;
        }
        missing_count += 1;
        if listed.len() < thresholds.missing_periods_limit {
            listed.push(label);
        }
    }
    if missing_count == 0 {
        return None;
    }
    Some(
        Finding::new(
            FindingType::Warning,
            FindingCode::MissingPeriods,
            Severity::Medium,
            "Missing time periods detected in the data.",
        )
        .with_evidence(format!("missing_count = {missing_count}"))
        .with_impact("Trends may be misleading due to data gaps.")
        .with_missing_periods(listed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{inference::infer_types, profiler::profile_columns};

    fn run(columns: Vec<Column>) -> TimeSeriesResult {
        run_with(columns, &Thresholds::default())
    }

    fn run_with(columns: Vec<Column>, thresholds: &Thresholds) -> TimeSeriesResult {
        let dataset = Dataset::new(columns).unwrap();
        let types = infer_types(&dataset, thresholds);
        let profiles = profile_columns(&dataset, &types, thresholds);
        detect_time_series(&dataset, &profiles, thresholds)
    }

    fn daily_rows(counts: &[usize]) -> Vec<String> {
        counts
            .iter()
            .enumerate()
            .flat_map(|(day, count)| vec![format!("2024-03-{:02}", day + 1); *count])
            .collect()
    }

    #[test]
    fn drop_in_last_period_is_a_high_risk() {
        let result = run(vec![Column::from_raw("date", &daily_rows(&[10, 10, 10, 3]))]);
        assert_eq!(result.date_column.as_deref(), Some("date"));
        assert_eq!(result.frequency, Some(Frequency::Daily));
        assert_eq!(result.series.len(), 4);
        assert_eq!(result.signals.len(), 1);
        let signal = &result.signals[0];
        assert_eq!(signal.code, FindingCode::SuddenDrop);
        assert_eq!(signal.kind, FindingType::Risk);
        assert_eq!(signal.severity, Severity::High);
        assert_eq!(signal.period.as_deref(), Some("2024-03-04"));
        assert_eq!(signal.evidence, vec!["change = -70%".to_string()]);
    }

    #[test]
    fn rise_in_last_period_is_a_spike() {
        let result = run(vec![Column::from_raw("date", &daily_rows(&[10, 10, 10, 14]))]);
        assert_eq!(result.signals.len(), 1);
        let signal = &result.signals[0];
        assert_eq!(signal.code, FindingCode::SuddenSpike);
        assert_eq!(signal.kind, FindingType::Signal);
        assert_eq!(signal.severity, Severity::Medium);
        assert_eq!(signal.evidence, vec!["change = +40%".to_string()]);
    }

    #[test]
    fn missing_day_is_reported() {
        let dates = ["2024-03-01", "2024-03-02", "2024-03-04", "2024-03-05"];
        let result = run(vec![Column::from_raw("day", &dates)]);
        assert_eq!(result.frequency, Some(Frequency::Daily));
        let gap = result
            .signals
            .iter()
            .find(|s| s.code == FindingCode::MissingPeriods)
            .expect("missing periods signal");
        assert_eq!(gap.kind, FindingType::Warning);
        assert_eq!(gap.evidence, vec!["missing_count = 1".to_string()]);
        assert_eq!(
            gap.missing_periods.as_deref(),
            Some(&["2024-03-03".to_string()][..])
        );
    }

    #[test]
    fn wide_gaps_switch_to_monthly_buckets() {
        let dates = ["2024-01-15", "2024-02-15", "2024-04-15", "2024-05-15"];
        let result = run(vec![Column::from_raw("month", &dates)]);
        assert_eq!(result.frequency, Some(Frequency::Monthly));
        let periods = result
            .series
            .iter()
            .map(|p| p.period.as_str())
            .collect::<Vec<_>>();
        assert_eq!(periods, vec!["2024-01", "2024-02", "2024-04", "2024-05"]);
        let gap = result.signals.last().expect("gap signal");
        assert_eq!(gap.code, FindingCode::MissingPeriods);
        assert_eq!(
            gap.missing_periods.as_deref(),
            Some(&["2024-03".to_string()][..])
        );
    }

    #[test]
    fn fewer_than_three_periods_keep_axis_but_no_series() {
        let dates = ["2024-03-01", "2024-03-01", "2024-03-02"];
        let result = run(vec![Column::from_raw("day", &dates)]);
        assert_eq!(result.date_column.as_deref(), Some("day"));
        assert_eq!(result.frequency, Some(Frequency::Daily));
        assert!(result.series.is_empty());
        assert!(result.signals.is_empty());
    }

    #[test]
    fn weak_parse_rate_yields_empty_result() {
        let cells = ["2024-03-01", "2024-03-02", "soon", "later", "never"];
        let result = run(vec![Column::from_raw("when", &cells)]);
        assert_eq!(result, TimeSeriesResult::default());
    }

    #[test]
    fn first_qualifying_column_wins_and_numbers_are_skipped() {
        let result = run(vec![
            Column::from_raw("amount", &["1", "2", "3", "4"]),
            Column::from_raw("label", &["a", "b", "c", "d"]),
            Column::from_raw("opened", &["2024-01-01", "2024-01-02", "2024-01-03", ""]),
            Column::from_raw("closed", &["2024-02-01", "2024-02-02", "2024-02-03", "2024-02-04"]),
        ]);
        // 3 of 4 rows parse (75%), enough to accept the earlier column.
        assert_eq!(result.date_column.as_deref(), Some("opened"));
        assert_eq!(result.series.len(), 3);
    }

    #[test]
    fn missing_period_list_is_capped_but_count_is_complete() {
        let dates = ["2024-01-01", "2024-01-02", "2024-01-20", "2024-01-21"];
        let result = run(vec![Column::from_raw("day", &dates)]);
        let gap = result
            .signals
            .iter()
            .find(|s| s.code == FindingCode::MissingPeriods)
            .expect("gap signal");
        assert_eq!(gap.evidence, vec!["missing_count = 17".to_string()]);
        let listed = gap.missing_periods.as_ref().unwrap();
        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0], "2024-01-03");
        assert_eq!(listed[9], "2024-01-12");
    }

    #[test]
    fn zero_threshold_accepts_first_textual_column_even_without_dates() {
        let thresholds = Thresholds {
            date_parse_threshold: 0.0,
            ..Thresholds::default()
        };
        let result = run_with(
            vec![
                Column::from_raw("label", &["a", "b", "c", "d"]),
                Column::from_raw("day", &["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"]),
            ],
            &thresholds,
        );
        assert_eq!(result, TimeSeriesResult::default());
    }

    #[test]
    fn non_text_storage_parses_to_nothing() {
        let column = Column::from_raw("n", &["1", "2", "3"]);
        assert_eq!(parse_dates(&column), vec![None, None, None]);
    }
}
