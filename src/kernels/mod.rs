//! This module serves as the public API for the collection of encoding kernels
//! the harness measures.
//!
//! Each kernel is a thin, stateless wrapper around an external compressor or
//! encoder. The two compressors share the `Compressor` trait so the evaluator
//! can be driven by either real adapters or test doubles.

use crate::error::AssetRatioError;

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Transport Encoding
pub mod base64;

/// Deflate-class Compression (zopfli, zlib container)
pub mod deflate;

/// Brotli-class Compression
pub mod brotli;

pub use self::brotli::BrotliCompressor;
pub use self::deflate::{ExternalZopfli, LibraryZopfli};

//==================================================================================
// 2. The Compressor Seam
//==================================================================================

/// A byte-to-byte compressor parameterized by a single effort knob.
///
/// `effort` is the iteration count for deflate-class compressors and the quality
/// level for brotli-class ones. Implementations hold no mutable state across
/// calls and must be deterministic for a fixed input and effort.
pub trait Compressor: Send + Sync {
    /// Short identifier used in log lines.
    fn name(&self) -> &'static str;

    fn compress(&self, input: &[u8], effort: u32) -> Result<Vec<u8>, AssetRatioError>;
}

impl<T: Compressor + ?Sized> Compressor for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn compress(&self, input: &[u8], effort: u32) -> Result<Vec<u8>, AssetRatioError> {
        (**self).compress(input, effort)
    }
}
