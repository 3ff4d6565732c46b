mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use labelscan_ocr::{
    run_batch, HttpFetcher, OcrBackend, OcrError, RowPipeline, SelectionPolicy, TextRecognizer,
};

use config::{Config, OcrConfig};

#[derive(Debug, Parser)]
#[command(name = "labelscan")]
#[command(about = "Extract product measurements from label images")]
#[command(version)]
pub struct Cli {
    /// Dataset CSV with `image_link` and `entity_name` columns
    pub dataset: Option<PathBuf>,
    /// Predictions CSV to write [default: predictions_output.csv]
    pub output: Option<PathBuf>,
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Tesseract data directory
    #[arg(long)]
    pub tessdata: Option<String>,
    /// OCR language code
    #[arg(long)]
    pub lang: Option<String>,
    /// first_valid, first_only or closest_to_keyword
    #[arg(long)]
    pub selection: Option<SelectionPolicy>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply(&cli);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let dataset_path = config
        .dataset_path
        .clone()
        .context("no dataset given; pass DATASET or set dataset_path in the config")?;
    let rows = labelscan_dataset::load_dataset(&dataset_path)
        .with_context(|| format!("failed to read dataset {}", dataset_path.display()))?;
    info!(rows = rows.len(), path = %dataset_path.display(), "Loaded dataset");

    let backend = build_backend(&config.ocr).context("failed to initialize OCR engine")?;
    let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
    let mut pipeline = RowPipeline::new(fetcher, TextRecognizer::new(backend, config.ocr.confusables))
        .with_enhance_options(config.enhance.clone())
        .with_policy(config.selection);

    let report = run_batch(&mut pipeline, &rows, config.progress_every).await;

    labelscan_dataset::save_predictions(&config.output_path, &report.records)
        .with_context(|| format!("failed to write {}", config.output_path.display()))?;
    info!(path = %config.output_path.display(), "Predictions saved");
    Ok(())
}

/// The engine is built once here and owned by the pipeline for the whole run.
#[cfg(feature = "tesseract")]
fn build_backend(ocr: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    let engine = labelscan_ocr::TesseractRecognizer::new(ocr.data_path.as_deref(), &ocr.language)?;
    info!(language = %ocr.language, "Tesseract initialized");
    Ok(Box::new(engine))
}

#[cfg(not(feature = "tesseract"))]
fn build_backend(_ocr: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    Err(OcrError::NotAvailable)
}
