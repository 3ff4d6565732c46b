use anyhow::{Context, Result};
use labelscan_ocr::{ConfusableScope, EnhanceOptions, SelectionPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Cli;

pub const DEFAULT_OUTPUT_PATH: &str = "predictions_output.csv";

/// Batch run configuration. Every key is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset_path: Option<PathBuf>,
    pub output_path: PathBuf,
    /// Per-image fetch timeout.
    pub fetch_timeout_secs: u64,
    /// Fallback filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log progress every N rows; 0 turns progress lines off.
    pub progress_every: usize,
    pub selection: SelectionPolicy,
    pub enhance: EnhanceOptions,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub language: String,
    /// Directory holding `<language>.traineddata`; engine default when unset.
    pub data_path: Option<String>,
    pub confusables: ConfusableScope,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            fetch_timeout_secs: 10,
            log_level: "info".to_string(),
            progress_every: 50,
            selection: SelectionPolicy::default(),
            enhance: EnhanceOptions::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            data_path: None,
            confusables: ConfusableScope::default(),
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self> {
        toml::from_str(s).context("invalid configuration")
    }

    /// Read `path` if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Command-line arguments win over file values.
    pub fn apply(&mut self, cli: &Cli) {
        if let Some(dataset) = &cli.dataset {
            self.dataset_path = Some(dataset.clone());
        }
        if let Some(output) = &cli.output {
            self.output_path = output.clone();
        }
        if let Some(dir) = &cli.tessdata {
            self.ocr.data_path = Some(dir.clone());
        }
        if let Some(lang) = &cli.lang {
            self.ocr.language = lang.clone();
        }
        if let Some(policy) = cli.selection {
            self.selection = policy;
        }
    }
}
