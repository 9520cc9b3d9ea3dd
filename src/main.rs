// src/main.rs
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use walkdir::WalkDir;

use cheapest_products::{
    config::{Params, DEFAULT_DELIMITER, DEFAULT_DUPLICATE_CAP, DEFAULT_RESULT_ROWS},
    csv::RecordWriter,
    error::Error,
    metrics::Metrics,
    pipeline,
};

#[derive(Parser, Debug)]
#[command(name = "cheapest-products", version)]
struct Cli {
    /// Directory scanned (non-recursively) for .csv input files.
    #[arg(long)]
    dir: PathBuf,
    /// Single-character field delimiter for input and output rows.
    #[arg(long, default_value_t = DEFAULT_DELIMITER)]
    delimiter: char,
    /// Maximum number of records in the final result.
    #[arg(long, default_value_t = DEFAULT_RESULT_ROWS)]
    result_rows: usize,
    /// Maximum records sharing one id that survive a single merge.
    #[arg(long, default_value_t = DEFAULT_DUPLICATE_CAP)]
    duplicate_cap: usize,
    /// Output file path.
    #[arg(long, default_value = "cheapest.csv")]
    out: PathBuf,
    /// Overwrite the output file if it already exists.
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();
    let params = Params::new(cli.dir, cli.delimiter, cli.result_rows, cli.duplicate_cap)?;

    let files = discover_sources(&params.directory)?;
    if files.is_empty() {
        bail!("no CSV files were found in the directory: {:?}", params.directory);
    }
    info!("processing {} CSV files from {:?}", files.len(), params.directory);

    let metrics = Arc::new(Metrics::new());
    let started = Instant::now();
    let records = pipeline::cheapest_records(files, params.clone(), metrics.clone()).await?;
    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        records = records.len(),
        "aggregation complete; {}",
        metrics.summary()
    );

    let writer = RecordWriter::new(cli.overwrite, params.delimiter);
    match writer.write(&cli.out, &records) {
        Ok(()) => info!("wrote {} records to {:?}", records.len(), cli.out),
        Err(Error::OutputExists(path)) => {
            bail!("output file {:?} already exists; pass --overwrite to replace it", path)
        }
        Err(e) => return Err(e).context("write output"),
    }
    Ok(())
}

fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("scan directory {dir:?}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}
