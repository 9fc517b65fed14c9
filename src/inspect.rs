//! Table views over parts of the analysis: column profiles, validator
//! issues, and the time-series axis.

use std::fmt::Write as _;

use anyhow::Result;
use log::info;

use crate::{
    analyze::load_input,
    cli::InspectArgs,
    dataset::format_number,
    io_utils,
    pipeline::AnalysisReport,
    profiler::{ColumnProfile, ColumnStats},
    ranking::RankingScheme,
    table::Table,
    timeseries::TimeSeriesResult,
};

pub fn execute_profile(args: &InspectArgs) -> Result<()> {
    let report = analyze(args)?;
    let rendered = render_profiles(&report.columns);
    io_utils::write_output(args.output.as_deref(), &rendered)
}

pub fn execute_validate(args: &InspectArgs) -> Result<()> {
    let report = analyze(args)?;
    info!(
        "{} critical issue(s), {} warning(s)",
        report.quality_summary.critical_issues, report.quality_summary.warnings
    );
    let rendered = render_issues(&report);
    io_utils::write_output(args.output.as_deref(), &rendered)
}

pub fn execute_trends(args: &InspectArgs) -> Result<()> {
    let report = analyze(args)?;
    let rendered = render_trends(&report.time_series);
    io_utils::write_output(args.output.as_deref(), &rendered)
}

fn analyze(args: &InspectArgs) -> Result<AnalysisReport> {
    let loaded = load_input(&args.input)?;
    Ok(loaded.analyze(RankingScheme::default()))
}

pub fn render_profiles(columns: &[ColumnProfile]) -> String {
    let mut table = Table::new(["column", "type", "nulls", "null %", "unique", "summary"])
        .align_right(&[2, 3, 4]);
    for column in columns {
        let metrics = &column.metrics;
        table.push_row([
            column.name.clone(),
            metrics.inferred_type.to_string(),
            metrics.null_count.to_string(),
            format!("{:.1}", metrics.null_percentage),
            metrics.unique_count.to_string(),
            summarize_stats(metrics.stats.as_ref()),
        ]);
    }
    table.render()
}

fn summarize_stats(stats: Option<&ColumnStats>) -> String {
    let fmt_opt = |value: Option<f64>| value.map(format_number).unwrap_or_default();
    match stats {
        Some(ColumnStats::Numeric(numeric)) => format!(
            "min={} median={} max={} outliers={}",
            fmt_opt(numeric.min),
            fmt_opt(numeric.median),
            fmt_opt(numeric.max),
            numeric.outlier_count
        ),
        Some(ColumnStats::Categorical(categorical)) => {
            let top = categorical
                .top_values
                .first()
                .map(|top| format!("top={} ({})", top.value, top.count))
                .unwrap_or_default();
            format!(
                "{top} dominant={:.2} entropy={:.3}",
                categorical.dominant_ratio, categorical.entropy
            )
            .trim_start()
            .to_string()
        }
        None => String::new(),
    }
}

pub fn render_issues(report: &AnalysisReport) -> String {
    let mut table = Table::new(["severity", "code", "column", "message"]);
    for issue in report.issues() {
        table.push_row([
            issue.severity.to_string(),
            issue.code.to_string(),
            issue.column.clone(),
            issue.message.clone(),
        ]);
    }
    if table.is_empty() {
        return "No data-quality issues found.\n".to_string();
    }
    table.render()
}

pub fn render_trends(time_series: &TimeSeriesResult) -> String {
    let (Some(column), Some(frequency)) = (&time_series.date_column, time_series.frequency) else {
        return "No date column detected.\n".to_string();
    };
    let mut output = String::new();
    let _ = writeln!(output, "Date column: {column} ({frequency})");
    let _ = writeln!(output);

    let mut periods = Table::new(["period", "count"]).align_right(&[1]);
    for point in &time_series.series {
        periods.push_row([point.period.clone(), point.count.to_string()]);
    }
    output.push_str(&periods.render());

    if !time_series.signals.is_empty() {
        let _ = writeln!(output);
        let mut signals = Table::new(["severity", "code", "period", "evidence"]);
        for signal in &time_series.signals {
            signals.push_row([
                signal.severity.to_string(),
                signal.code.to_string(),
                signal.period.clone().unwrap_or_default(),
                signal.evidence.join("; "),
            ]);
        }
        output.push_str(&signals.render());
    }
    output
}
