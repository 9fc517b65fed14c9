use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    chat::Intent,
    ingest::{DEFAULT_MAX_ROWS, DEFAULT_SAMPLE_SEED},
    ranking::RankingScheme,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Deterministic data-quality checks and insights for CSV files",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline and emit a JSON analysis report
    Analyze(AnalyzeArgs),
    /// Show per-column type, null, cardinality, and summary statistics
    Profile(InspectArgs),
    /// List data-quality issues raised by the validator
    Validate(InspectArgs),
    /// Show the detected time axis, period counts, and temporal signals
    Trends(InspectArgs),
    /// Answer a scoped question about one insight of the report
    Ask(AskArgs),
}

/// Flags shared by every command that loads a CSV file.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input CSV file (`-` reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8 with windows-1252 fallback)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Rows above which a seeded uniform sample is analysed instead
    #[arg(long = "max-rows", default_value_t = DEFAULT_MAX_ROWS)]
    pub max_rows: usize,
    /// Seed for the row sampler
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SEED)]
    pub seed: u64,
    /// YAML file overriding analysis thresholds
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Strategy used to turn insights into next steps
    #[arg(long, value_enum, default_value_t = RankingScheme::PriorityTable)]
    pub ranking: RankingScheme,
    /// Emit single-line JSON instead of pretty-printed output
    #[arg(long)]
    pub compact: bool,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Write the rendered table to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct AskArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Zero-based position of the insight in the report
    #[arg(long = "insight")]
    pub insight: usize,
    /// Question to answer about the insight
    #[arg(long = "intent", value_enum)]
    pub intent: Intent,
    /// Print the prompt payload alongside the answer
    #[arg(long = "show-prompt")]
    pub show_prompt: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let Some(first) = chars.next() else {
                return Err("Delimiter cannot be empty".to_string());
            };
            if chars.next().is_some() {
                return Err(format!("Delimiter '{other}' must be a single character"));
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
