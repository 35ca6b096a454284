// In: src/pipeline/models.rs

//! The closed set of pipelines the harness measures, and the stages they are
//! built from.
//!
//! Pipelines are configuration, not runtime state. Every pipeline is an ordered
//! list of `Stage`s applied left to right to a file's raw bytes; the pipeline's
//! measurement is the byte length of the final output.

use std::fmt;

/// A single transform within a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// URL-safe, padding-free base64. The encoded text is fed on as bytes.
    Base64,
    /// Deflate-class compression (zopfli, zlib container).
    Deflate,
    /// Brotli-class compression.
    Brotli,
}

/// One of the seven measured encoding pipelines, in report column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pipeline {
    Raw,
    Deflate,
    Base64Deflate,
    DeflateBase64Deflate,
    Brotli,
    Base64Brotli,
    BrotliBase64Brotli,
}

impl Pipeline {
    /// Every pipeline, in the fixed report column order.
    pub const ALL: [Pipeline; 7] = [
        Pipeline::Raw,
        Pipeline::Deflate,
        Pipeline::Base64Deflate,
        Pipeline::DeflateBase64Deflate,
        Pipeline::Brotli,
        Pipeline::Base64Brotli,
        Pipeline::BrotliBase64Brotli,
    ];

    /// The report column header for this pipeline.
    pub fn name(self) -> &'static str {
        match self {
            Pipeline::Raw => "raw",
            Pipeline::Deflate => "deflate",
            Pipeline::Base64Deflate => "base64 + deflate",
            Pipeline::DeflateBase64Deflate => "deflate + base64 + deflate",
            Pipeline::Brotli => "brotli",
            Pipeline::Base64Brotli => "base64 + brotli",
            Pipeline::BrotliBase64Brotli => "brotli + base64 + brotli",
        }
    }

    /// The ordered transforms applied to the raw bytes.
    pub fn stages(self) -> &'static [Stage] {
        use Stage::*;
        match self {
            Pipeline::Raw => &[],
            Pipeline::Deflate => &[Deflate],
            Pipeline::Base64Deflate => &[Base64, Deflate],
            Pipeline::DeflateBase64Deflate => &[Deflate, Base64, Deflate],
            Pipeline::Brotli => &[Brotli],
            Pipeline::Base64Brotli => &[Base64, Brotli],
            Pipeline::BrotliBase64Brotli => &[Brotli, Base64, Brotli],
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
