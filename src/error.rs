// In: src/error.rs

//! This module defines the single, unified error type for the asset-ratio harness.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Errors fall into two classes. Fatal errors mean the run's infrastructure is
//! broken (an input cannot be read, the zopfli binary is missing) and abort the
//! whole run. Non-fatal errors are local to one pipeline measurement and are
//! recorded as a missing cell in the report.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetRatioError {
    // =========================================================================
    // === Fatal, Run-Level Errors
    // =========================================================================
    /// An input file could not be read, or the report could not be written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Input '{}' is {size} bytes, above the {limit} byte limit", path.display())]
    InputTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// The external deflate-class tool is missing, failed to start, exited
    /// non-zero or timed out.
    #[error("External tool failed: {0}")]
    ExternalTool(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An error from the Serde JSON library, while loading a config or rendering a report.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Report rendering failed: {0}")]
    Report(String),

    // =========================================================================
    // === Non-Fatal, Measurement-Level Errors
    // =========================================================================
    #[error("Compression failed: {0}")]
    Compression(String),

    #[error("Text encoding failed: {0}")]
    Encoding(String),

    #[error("Pipeline '{pipeline}' failed for '{file}': {source}")]
    Pipeline {
        file: String,
        pipeline: &'static str,
        #[source]
        source: Box<AssetRatioError>,
    },
}

impl AssetRatioError {
    /// Builds an `Io` error bound to the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssetRatioError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the error must abort the whole run rather than being
    /// recorded as a missing measurement.
    pub fn is_fatal(&self) -> bool {
        match self {
            AssetRatioError::Compression(_) | AssetRatioError::Encoding(_) => false,
            AssetRatioError::Pipeline { source, .. } => source.is_fatal(),
            _ => true,
        }
    }
}

impl From<csv::Error> for AssetRatioError {
    fn from(err: csv::Error) -> Self {
        AssetRatioError::Report(err.to_string())
    }
}
