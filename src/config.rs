// In: src/config.rs

//! The single source of truth for all asset-ratio run configuration.
//!
//! This module defines the unified `BenchConfig` struct, which is created once
//! at the application boundary (defaults, then an optional JSON file, then CLI
//! overrides) and then passed down by shared reference to the driver and the
//! compressor adapters.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AssetRatioError;

/// Highest quality level accepted by the brotli encoder.
pub const MAX_BROTLI_QUALITY: u32 = 11;

//==================================================================================
// I. Core Configuration Enums & Structs
//==================================================================================

/// Selects how the deflate-class compressor is invoked.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeflateBackend {
    /// **Default:** Spawn the `zopfli` command-line tool once per compression,
    /// handing it the payload through a scoped temp file.
    #[default]
    External,

    /// Run the `zopfli` crate in-process with the same parameters. No binary
    /// is required on PATH.
    Library,
}

/// Output format of the persisted report.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// **Default:** Comma-delimited table, one row per file.
    #[default]
    Csv,

    /// An array of JSON objects keyed by pipeline name, with `null` for
    /// missing measurements.
    Json,
}

/// Settings for the deflate-class compressor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DeflateConfig {
    #[serde(default)]
    pub backend: DeflateBackend,

    /// Program name or path used by the external backend.
    #[serde(default = "default_program")]
    pub program: String,

    /// Iteration count for a deflate stage applied to the raw file bytes.
    #[serde(default = "default_iterations")]
    pub file_iterations: u32,

    /// Iteration count for a deflate stage applied to base64 text.
    #[serde(default = "default_iterations")]
    pub encoded_iterations: u32,

    /// Wall-clock limit for a single external zopfli invocation.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl DeflateConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DeflateConfig {
    fn default() -> Self {
        Self {
            backend: DeflateBackend::default(),
            program: default_program(),
            file_iterations: default_iterations(),
            encoded_iterations: default_iterations(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings for the brotli-class compressor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BrotliConfig {
    /// 0 (fastest) to 11 (smallest).
    #[serde(default = "default_quality")]
    pub quality: u32,

    /// Base-2 logarithm of the sliding window size.
    #[serde(default = "default_lgwin")]
    pub lgwin: u32,
}

impl Default for BrotliConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            lgwin: default_lgwin(),
        }
    }
}

//==================================================================================
// II. The Unified BenchConfig
//==================================================================================

/// The single, unified configuration for one harness run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BenchConfig {
    /// Directory every entry of `files` is resolved against.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Where the rendered report is written. Overwritten on every run.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// The ordered sample list. Report rows follow this order.
    #[serde(default = "default_files")]
    pub files: Vec<String>,

    #[serde(default)]
    pub format: ReportFormat,

    /// Inputs larger than this abort the run before any compression starts.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,

    #[serde(default)]
    pub deflate: DeflateConfig,

    #[serde(default)]
    pub brotli: BrotliConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_path: default_output_path(),
            files: default_files(),
            format: ReportFormat::default(),
            max_input_bytes: default_max_input_bytes(),
            deflate: DeflateConfig::default(),
            brotli: BrotliConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Loads a config from a JSON file. Absent fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, AssetRatioError> {
        let text = std::fs::read_to_string(path).map_err(|e| AssetRatioError::io(path, e))?;
        let config: BenchConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Rejects settings no compressor could honor.
    pub fn validate(&self) -> Result<(), AssetRatioError> {
        if self.files.is_empty() {
            return Err(AssetRatioError::Config("no input files configured".into()));
        }
        if self.brotli.quality > MAX_BROTLI_QUALITY {
            return Err(AssetRatioError::Config(format!(
                "brotli quality must be 0-{}, got {}",
                MAX_BROTLI_QUALITY, self.brotli.quality
            )));
        }
        if self.deflate.file_iterations == 0 || self.deflate.encoded_iterations == 0 {
            return Err(AssetRatioError::Config(
                "deflate iteration counts must be at least 1".into(),
            ));
        }
        if self.deflate.timeout_secs == 0 {
            return Err(AssetRatioError::Config(
                "deflate timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }

    /// Resolves a configured filename against `input_dir`.
    pub fn input_path(&self, filename: &str) -> PathBuf {
        self.input_dir.join(filename)
    }
}

fn default_program() -> String {
    "zopfli".to_string()
}

fn default_iterations() -> u32 {
    100
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_quality() -> u32 {
    MAX_BROTLI_QUALITY
}

fn default_lgwin() -> u32 {
    22
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("files")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("report.csv")
}

fn default_files() -> Vec<String> {
    [
        "char5x5.png",
        "wow.ogg",
        "wow.pulsejet",
        "loss.svg",
        "suzanne.glb",
        "scene1.bin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// 64 MiB
fn default_max_input_bytes() -> u64 {
    64 * 1024 * 1024
}
