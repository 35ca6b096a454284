// In: src/pipeline/mod.rs

//! The pipeline engine: the fixed pipeline matrix and the evaluator that runs it.

pub mod evaluator;
pub mod models;

pub use evaluator::{Evaluator, MeasurementRow, StageParams};
pub use models::{Pipeline, Stage};
