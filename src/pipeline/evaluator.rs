// In: src/pipeline/evaluator.rs

//! The pipeline evaluator: turns one file's raw bytes into one measurement per
//! pipeline.
//!
//! Pipelines are executed in column order. Every stage output (`deflate(R)`,
//! `base64(R)`, `base64(deflate(R))`, ...) is kept in a per-file memo keyed by
//! stage prefix, so each is computed once and the three-stage pipelines always
//! consume the already-compressed intermediate.
//! The memo is dropped when `evaluate` returns; nothing carries over between files.

use std::rc::Rc;
use std::time::Instant;

use hashbrown::HashMap;

use crate::config::{BenchConfig, DeflateBackend};
use crate::error::AssetRatioError;
use crate::kernels::{self, BrotliCompressor, Compressor, ExternalZopfli, LibraryZopfli};
use crate::pipeline::models::{Pipeline, Stage};

//==================================================================================
// 1. Measurement Row
//==================================================================================

/// All measurements recorded for one file.
///
/// A pipeline with no recorded size is absent, never zero. Each absent entry
/// has a matching entry in `failures()`.
#[derive(Debug)]
pub struct MeasurementRow {
    filename: String,
    sizes: HashMap<Pipeline, usize>,
    failures: Vec<(Pipeline, AssetRatioError)>,
}

impl MeasurementRow {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            sizes: HashMap::with_capacity(Pipeline::ALL.len()),
            failures: Vec::new(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn record(&mut self, pipeline: Pipeline, size: usize) {
        self.sizes.insert(pipeline, size);
    }

    pub fn record_failure(&mut self, pipeline: Pipeline, error: AssetRatioError) {
        self.sizes.remove(&pipeline);
        self.failures.push((pipeline, error));
    }

    pub fn get(&self, pipeline: Pipeline) -> Option<usize> {
        self.sizes.get(&pipeline).copied()
    }

    pub fn failures(&self) -> &[(Pipeline, AssetRatioError)] {
        &self.failures
    }

    /// True when every pipeline has a recorded size.
    pub fn is_complete(&self) -> bool {
        Pipeline::ALL.iter().all(|p| self.sizes.contains_key(p))
    }
}

//==================================================================================
// 2. Stage Parameters
//==================================================================================

/// Effort settings handed to the compressors, per stage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageParams {
    /// Iterations for a deflate stage whose input is not base64 text.
    pub deflate_file_iterations: u32,
    /// Iterations for a deflate stage applied to base64 text.
    pub deflate_encoded_iterations: u32,
    pub brotli_quality: u32,
}

impl StageParams {
    fn deflate_effort(&self, previous: Option<Stage>) -> u32 {
        match previous {
            Some(Stage::Base64) => self.deflate_encoded_iterations,
            _ => self.deflate_file_iterations,
        }
    }
}

impl From<&BenchConfig> for StageParams {
    fn from(config: &BenchConfig) -> Self {
        Self {
            deflate_file_iterations: config.deflate.file_iterations,
            deflate_encoded_iterations: config.deflate.encoded_iterations,
            brotli_quality: config.brotli.quality,
        }
    }
}

//==================================================================================
// 3. The Evaluator
//==================================================================================

type Memo = HashMap<&'static [Stage], Result<Rc<Vec<u8>>, String>>;

/// Computes the seven pipeline measurements for a file.
pub struct Evaluator<D = Box<dyn Compressor>, B = Box<dyn Compressor>> {
    deflate: D,
    brotli: B,
    params: StageParams,
}

impl Evaluator {
    /// Builds an evaluator with the adapters selected by `config`.
    pub fn from_config(config: &BenchConfig) -> Self {
        let deflate: Box<dyn Compressor> = match config.deflate.backend {
            DeflateBackend::External => Box::new(ExternalZopfli::new(&config.deflate)),
            DeflateBackend::Library => Box::new(LibraryZopfli),
        };
        let brotli: Box<dyn Compressor> = Box::new(BrotliCompressor::new(&config.brotli));
        Evaluator::new(deflate, brotli, StageParams::from(config))
    }
}

impl<D: Compressor, B: Compressor> Evaluator<D, B> {
    pub fn new(deflate: D, brotli: B, params: StageParams) -> Self {
        Self {
            deflate,
            brotli,
            params,
        }
    }

    /// Measures every pipeline for `raw`, calling `on_measured` once per
    /// pipeline in column order with its size, or `None` if it failed.
    ///
    /// Non-fatal stage errors are recorded on the row. A fatal error aborts and
    /// is returned wrapped with the file and pipeline it occurred in.
    pub fn evaluate<F>(
        &self,
        filename: &str,
        raw: &[u8],
        mut on_measured: F,
    ) -> Result<MeasurementRow, AssetRatioError>
    where
        F: FnMut(Pipeline, Option<usize>),
    {
        let mut row = MeasurementRow::new(filename);
        let mut memo = Memo::new();
        memo.insert(&[], Ok(Rc::new(raw.to_vec())));

        for pipeline in Pipeline::ALL {
            match self.measure(pipeline, &mut memo) {
                Ok(size) => {
                    row.record(pipeline, size);
                    on_measured(pipeline, Some(size));
                }
                Err(e) if e.is_fatal() => {
                    return Err(AssetRatioError::Pipeline {
                        file: filename.to_string(),
                        pipeline: pipeline.name(),
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    row.record_failure(pipeline, e);
                    on_measured(pipeline, None);
                }
            }
        }

        Ok(row)
    }

    fn measure(&self, pipeline: Pipeline, memo: &mut Memo) -> Result<usize, AssetRatioError> {
        let stages = pipeline.stages();

        // 1. Resume from the longest intermediate already computed for this file.
        let (mut done, entry) = (0..=stages.len())
            .rev()
            .find_map(|len| memo.get(&stages[..len]).map(|entry| (len, entry.clone())))
            .ok_or_else(|| AssetRatioError::Compression("raw bytes missing from memo".into()))?;
        // A failed shared intermediate fails every pipeline built on it.
        let mut current = entry.map_err(|reason| {
            AssetRatioError::Compression(format!(
                "intermediate {:?} unavailable ({})",
                &stages[..done],
                reason
            ))
        })?;

        // 2. Apply the remaining stages, memoizing each prefix.
        while done < stages.len() {
            let stage = stages[done];
            let previous = done.checked_sub(1).map(|i| stages[i]);
            let prefix = &stages[..=done];

            let started = Instant::now();
            match self.run_stage(stage, previous, &current) {
                Ok(bytes) => {
                    log::debug!(
                        "  - {:<28} {:<10}: {} -> {} bytes in {:.2?}",
                        pipeline.name(),
                        self.stage_label(stage),
                        current.len(),
                        bytes.len(),
                        started.elapsed()
                    );
                    current = Rc::new(bytes);
                    memo.insert(prefix, Ok(Rc::clone(&current)));
                }
                Err(e) => {
                    if !e.is_fatal() {
                        memo.insert(prefix, Err(e.to_string()));
                    }
                    return Err(e);
                }
            }
            done += 1;
        }

        Ok(current.len())
    }

    fn stage_label(&self, stage: Stage) -> &'static str {
        match stage {
            Stage::Base64 => "base64",
            Stage::Deflate => self.deflate.name(),
            Stage::Brotli => self.brotli.name(),
        }
    }

    fn run_stage(
        &self,
        stage: Stage,
        previous: Option<Stage>,
        input: &[u8],
    ) -> Result<Vec<u8>, AssetRatioError> {
        match stage {
            Stage::Base64 => Ok(kernels::base64::encode(input)),
            Stage::Deflate => self
                .deflate
                .compress(input, self.params.deflate_effort(previous)),
            Stage::Brotli => self.brotli.compress(input, self.params.brotli_quality),
        }
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
