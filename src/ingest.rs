//! CSV ingestion: decoding, dataset construction, and seeded row sampling.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info};
use rand::{SeedableRng, rngs::StdRng, seq::index};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{dataset::Dataset, io_utils};

pub const DEFAULT_MAX_ROWS: usize = 50_000;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV is empty after sampling")]
    EmptyDataset,
    #[error("max_rows must be greater than zero")]
    ZeroRowBudget,
}

/// How much of the source the analysed snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngestionMeta {
    pub total_rows: usize,
    pub sampled: bool,
    pub sample_size: usize,
    pub sampling_ratio: f64,
}

impl IngestionMeta {
    pub fn full(total_rows: usize) -> Self {
        Self {
            total_rows,
            sampled: false,
            sample_size: total_rows,
            sampling_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub delimiter: Option<u8>,
    pub encoding: Option<&'static Encoding>,
    pub max_rows: usize,
    pub seed: u64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: None,
            max_rows: DEFAULT_MAX_ROWS,
            seed: DEFAULT_SAMPLE_SEED,
        }
    }
}

pub fn load_csv(path: &Path, options: &IngestOptions) -> Result<(Dataset, IngestionMeta)> {
    let bytes = io_utils::read_input(path)?;
    let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
    let (dataset, meta) = load_bytes(&bytes, delimiter, options)
        .with_context(|| format!("Loading CSV from {path:?}"))?;
    info!(
        "Loaded {} row(s) x {} column(s) from {:?}{}",
        dataset.row_count(),
        dataset.column_count(),
        path,
        if meta.sampled {
            format!(" (sampled from {})", meta.total_rows)
        } else {
            String::new()
        }
    );
    Ok((dataset, meta))
}

pub fn load_bytes(
    bytes: &[u8],
    delimiter: u8,
    options: &IngestOptions,
) -> Result<(Dataset, IngestionMeta)> {
    if options.max_rows == 0 {
        return Err(IngestError::ZeroRowBudget.into());
    }
    let text = io_utils::decode_text(bytes, options.encoding)?;
    let mut reader = io_utils::open_csv_reader(text.as_bytes(), delimiter, true);
    let headers = reader
        .headers()
        .context("Reading CSV header")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    debug!("Parsed {} data row(s) under {} header(s)", rows.len(), headers.len());
    let dataset = Dataset::from_records(headers, rows)?;
    let (dataset, meta) = sample_rows(dataset, options.max_rows, options.seed);
    if dataset.is_empty() {
        return Err(IngestError::EmptyDataset.into());
    }
    Ok((dataset, meta))
}

/// Draws a seeded uniform sample of `max_rows` rows when the dataset is
/// larger; sampled rows keep their original relative order.
pub fn sample_rows(dataset: Dataset, max_rows: usize, seed: u64) -> (Dataset, IngestionMeta) {
    let total_rows = dataset.row_count();
    if total_rows <= max_rows {
        return (dataset, IngestionMeta::full(total_rows));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, total_rows, max_rows).into_vec();
    picked.sort_unstable();
    let meta = IngestionMeta {
        total_rows,
        sampled: true,
        sample_size: max_rows,
        sampling_ratio: max_rows as f64 / total_rows as f64,
    };
    (dataset.select_rows(&picked), meta)
}
