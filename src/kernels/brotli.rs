//! This module contains the stateless kernels for brotli compression and
//! decompression.
//!
//! It is a panic-free wrapper around the `brotli` crate. Quality values above 11
//! are rejected instead of being clamped, so a misconfigured run shows up as a
//! missing measurement rather than a silently different one.

use std::io::Cursor;

use brotli::enc::BrotliEncoderParams;

use crate::config::{BrotliConfig, MAX_BROTLI_QUALITY};
use crate::error::AssetRatioError;
use crate::kernels::Compressor;

//==================================================================================
// 1. Core Logic
//==================================================================================

/// Compresses a byte slice with brotli at `quality` (0-11) and window `lgwin`.
pub fn compress(input_bytes: &[u8], quality: u32, lgwin: u32) -> Result<Vec<u8>, AssetRatioError> {
    if quality > MAX_BROTLI_QUALITY {
        return Err(AssetRatioError::Compression(format!(
            "brotli quality must be 0-{}, got {}",
            MAX_BROTLI_QUALITY, quality
        )));
    }

    let mut params = BrotliEncoderParams::default();
    params.quality = quality as i32;
    params.lgwin = lgwin as i32;

    let mut reader = Cursor::new(input_bytes);
    let mut output_buf = Vec::with_capacity(input_bytes.len() / 2 + 16);
    brotli::BrotliCompress(&mut reader, &mut output_buf, &params)
        .map_err(|e| AssetRatioError::Compression(format!("brotli: {}", e)))?;
    Ok(output_buf)
}

/// Decompresses a brotli stream.
pub fn decompress(input_bytes: &[u8]) -> Result<Vec<u8>, AssetRatioError> {
    let mut reader = Cursor::new(input_bytes);
    let mut output_buf = Vec::new();
    brotli::BrotliDecompress(&mut reader, &mut output_buf)
        .map_err(|e| AssetRatioError::Compression(format!("brotli decode: {}", e)))?;
    Ok(output_buf)
}

//==================================================================================
// 2. Compressor Adapter
//==================================================================================

/// The in-process brotli adapter. `effort` passed to `compress` is the quality.
#[derive(Debug, Clone, Copy)]
pub struct BrotliCompressor {
    lgwin: u32,
}

impl BrotliCompressor {
    pub fn new(config: &BrotliConfig) -> Self {
        Self {
            lgwin: config.lgwin,
        }
    }
}

impl Default for BrotliCompressor {
    fn default() -> Self {
        Self::new(&BrotliConfig::default())
    }
}

impl Compressor for BrotliCompressor {
    fn name(&self) -> &'static str {
        "brotli"
    }

    fn compress(&self, input: &[u8], effort: u32) -> Result<Vec<u8>, AssetRatioError> {
        compress(input, effort, self.lgwin)
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
