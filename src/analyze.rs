use anyhow::{Context, Result};
use log::info;

use crate::{
    chat,
    cli::{AnalyzeArgs, AskArgs, InputArgs},
    config::Thresholds,
    dataset::Dataset,
    ingest::{self, IngestOptions, IngestionMeta},
    io_utils,
    pipeline::{self, AnalysisReport},
    printable_delimiter,
    ranking::RankingScheme,
};

/// A dataset loaded from the command line together with the thresholds
/// the run should use.
pub struct LoadedInput {
    pub dataset: Dataset,
    pub ingestion: IngestionMeta,
    pub thresholds: Thresholds,
}

impl LoadedInput {
    pub fn analyze(&self, ranking: RankingScheme) -> AnalysisReport {
        pipeline::analyze(&self.dataset, &self.ingestion, &self.thresholds, ranking)
    }
}

pub fn load_input(args: &InputArgs) -> Result<LoadedInput> {
    let thresholds = match &args.config {
        Some(path) => Thresholds::load(path)?,
        None => Thresholds::default(),
    };
    let options = IngestOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        max_rows: args.max_rows,
        seed: args.seed,
    };
    info!(
        "Reading '{}' using delimiter '{}'",
        args.input.display(),
        printable_delimiter(io_utils::resolve_input_delimiter(
            &args.input,
            options.delimiter
        ))
    );
    let (dataset, ingestion) = ingest::load_csv(&args.input, &options)?;
    Ok(LoadedInput {
        dataset,
        ingestion,
        thresholds,
    })
}

pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let loaded = load_input(&args.input)?;
    let report = loaded.analyze(args.ranking);
    let json = if args.compact {
        serde_json::to_string(&report)
    } else {
        serde_json::to_string_pretty(&report)
    }
    .context("Serializing analysis report")?;
    io_utils::write_output(args.output.as_deref(), &json)?;
    if let Some(path) = &args.output {
        info!(
            "Report with {} insight(s) written to {:?}",
            report.insights.len(),
            path
        );
    }
    Ok(())
}

pub fn execute_ask(args: &AskArgs) -> Result<()> {
    let intent = args.intent;
    let loaded = load_input(&args.input)?;
    let report = loaded.analyze(RankingScheme::default());
    let payload = if args.show_prompt {
        let insight = chat::insight_at(&report.insights, args.insight)?;
        let prompt = chat::build_scoped_prompt(insight, intent);
        let answer = chat::generate_scoped_answer(&prompt);
        serde_json::json!({ "prompt": prompt, "answer": answer })
    } else {
        serde_json::to_value(chat::ask(&report.insights, args.insight, intent)?)?
    };
    let json = serde_json::to_string_pretty(&payload).context("Serializing scoped answer")?;
    io_utils::write_output(None, &json)
}
