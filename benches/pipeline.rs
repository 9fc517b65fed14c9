use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use csv_insights::config::Thresholds;
use csv_insights::ingest::{self, IngestOptions};
use csv_insights::pipeline;
use csv_insights::ranking::RankingScheme;
use tempfile::TempDir;

fn generate_orders(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("orders.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "id,ordered_at,region,amount,note").expect("header");
    for i in 0..rows {
        let region = match i % 10 {
            0 => "South",
            1 => "East",
            _ => "North",
        };
        let day = (i % 28) + 1;
        let amount = 20.0 + (i % 97) as f64 * 1.25;
        let note = if i % 4 == 0 { "follow up" } else { "" };
        writeln!(file, "{i},2024-02-{day:02},{region},{amount},{note}").expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_pipeline(c: &mut Criterion) {
    let (_dir, csv_path) = generate_orders(20_000);
    let options = IngestOptions::default();
    let thresholds = Thresholds::default();

    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);

    group.bench_function("load_csv", |b| {
        b.iter(|| ingest::load_csv(&csv_path, &options).expect("load"))
    });

    let (dataset, meta) = ingest::load_csv(&csv_path, &options).expect("load");
    for scheme in [RankingScheme::PriorityTable, RankingScheme::Weighted] {
        group.bench_function(format!("analyze_{scheme}"), |b| {
            b.iter_batched(
                || dataset.clone(),
                |dataset| pipeline::analyze(&dataset, &meta, &thresholds, scheme),
                BatchSize::LargeInput,
            )
        });
    }

    let sampled_options = IngestOptions {
        max_rows: 5_000,
        ..IngestOptions::default()
    };
    group.bench_function("load_csv_sampled", |b| {
        b.iter(|| ingest::load_csv(&csv_path, &sampled_options).expect("load"))
    });
    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
