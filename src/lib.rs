//! This file is the root of the `asset_ratio` crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`pipeline`, `kernels`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the handful of types a caller needs to run the harness.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod config;
pub mod driver;
pub mod error;
pub mod kernels;
pub mod pipeline;
pub mod report;

//==================================================================================
// 2. Public API
//==================================================================================
pub use config::{BenchConfig, BrotliConfig, DeflateBackend, DeflateConfig, ReportFormat};
pub use driver::{persist, run, run_to_output};
pub use error::AssetRatioError;
pub use kernels::Compressor;
pub use pipeline::{Evaluator, MeasurementRow, Pipeline, Stage, StageParams};
pub use report::Report;
