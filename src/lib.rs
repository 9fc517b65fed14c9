pub mod analyze;
pub mod chat;
pub mod cli;
pub mod confidence;
pub mod config;
pub mod dataset;
pub mod findings;
pub mod inference;
pub mod ingest;
pub mod insights;
pub mod inspect;
pub mod io_utils;
pub mod pipeline;
pub mod profiler;
pub mod ranking;
pub mod stats;
pub mod table;
pub mod timeseries;
pub mod validator;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_insights", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command: {:?}", cli.command);
    match cli.command {
        Commands::Analyze(args) => analyze::execute(&args),
        Commands::Profile(args) => inspect::execute_profile(&args),
        Commands::Validate(args) => inspect::execute_validate(&args),
        Commands::Trends(args) => inspect::execute_trends(&args),
        Commands::Ask(args) => analyze::execute_ask(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
