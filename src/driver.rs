// In: src/driver.rs

//! The driver: walks the configured file list, feeds each sample to the
//! evaluator, reports progress and fills the report it was handed.
//!
//! Files are processed one at a time in configured order. A file that cannot
//! be read aborts the run. Progress is best-effort: a failing progress writer
//! is logged and otherwise ignored, and it is flushed before `run` returns so
//! every marker precedes the report write.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use crate::config::{BenchConfig, ReportFormat};
use crate::error::AssetRatioError;
use crate::kernels::Compressor;
use crate::pipeline::Evaluator;
use crate::report::Report;

/// Measures every configured file and returns the filled report.
pub fn run<D, B, W>(
    config: &BenchConfig,
    evaluator: &Evaluator<D, B>,
    mut report: Report,
    progress: &mut W,
) -> Result<Report, AssetRatioError>
where
    D: Compressor,
    B: Compressor,
    W: Write + ?Sized,
{
    for filename in &config.files {
        // 1. Read the sample. Any failure here is fatal.
        let path = config.input_path(filename);
        let raw = read_sample(&path, config.max_input_bytes)?;
        log::info!("{}: {} bytes", filename, raw.len());

        // 2. Measure, emitting one marker per finished pipeline.
        emit(progress, format!("Processing {} ", filename).as_bytes());
        let started = Instant::now();
        let row = evaluator.evaluate(filename, &raw, |_, size| {
            let marker: &[u8] = if size.is_some() { b"." } else { b"x" };
            emit(progress, marker);
        })?;
        emit(progress, b"\n");

        for (pipeline, error) in row.failures() {
            log::warn!("{}: '{}' measurement missing: {}", filename, pipeline, error);
        }
        log::info!("{}: measured in {:.2?}", filename, started.elapsed());

        // 3. Record.
        report.push(row);
    }

    if let Err(e) = progress.flush() {
        log::warn!("failed to flush progress output: {}", e);
    }
    Ok(report)
}

/// Renders `report` and writes it to `path`, replacing any previous report.
pub fn persist(report: &Report, path: &Path, format: ReportFormat) -> Result<(), AssetRatioError> {
    let text = report.render(format)?;
    fs::write(path, text).map_err(|e| AssetRatioError::io(path, e))?;
    log::info!("wrote {} rows to {}", report.len(), path.display());
    Ok(())
}

/// Builds the evaluator from `config`, measures every file and writes the report
/// to `config.output_path`.
pub fn run_to_output<W: Write + ?Sized>(
    config: &BenchConfig,
    progress: &mut W,
) -> Result<Report, AssetRatioError> {
    config.validate()?;
    let evaluator = Evaluator::from_config(config);
    let report = run(config, &evaluator, Report::new(), progress)?;
    persist(&report, &config.output_path, config.format)?;
    Ok(report)
}

fn read_sample(path: &Path, limit: u64) -> Result<Vec<u8>, AssetRatioError> {
    let metadata = fs::metadata(path).map_err(|e| AssetRatioError::io(path, e))?;
    if metadata.len() > limit {
        return Err(AssetRatioError::InputTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            limit,
        });
    }
    fs::read(path).map_err(|e| AssetRatioError::io(path, e))
}

fn emit<W: Write + ?Sized>(progress: &mut W, bytes: &[u8]) {
    if let Err(e) = progress.write_all(bytes).and_then(|_| progress.flush()) {
        log::debug!("progress output failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{BrotliCompressor, LibraryZopfli};
    use crate::pipeline::{Pipeline, StageParams};
    use tempfile::TempDir;

    struct RefusingCompressor;

    impl Compressor for RefusingCompressor {
        fn name(&self) -> &'static str {
            "refusing"
        }

        fn compress(&self, _input: &[u8], _effort: u32) -> Result<Vec<u8>, AssetRatioError> {
            Err(AssetRatioError::Compression("refused".into()))
        }
    }

    fn fast_params() -> StageParams {
        StageParams {
            deflate_file_iterations: 1,
            deflate_encoded_iterations: 1,
            brotli_quality: 5,
        }
    }

    fn sample_dir(files: &[(&str, &[u8])]) -> (TempDir, BenchConfig) {
        let dir = TempDir::new().unwrap();
        for (name, bytes) in files {
            fs::write(dir.path().join(name), bytes).unwrap();
        }
        let config = BenchConfig {
            input_dir: dir.path().to_path_buf(),
            output_path: dir.path().join("report.csv"),
            files: files.iter().map(|(name, _)| name.to_string()).collect(),
            ..BenchConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_run_emits_progress_markers_per_pipeline() {
        let (_dir, config) = sample_dir(&[("a.txt", &b"hello hello hello"[..]), ("b.txt", &b""[..])]);
        let evaluator = Evaluator::new(LibraryZopfli, BrotliCompressor::default(), fast_params());
        let mut progress = Vec::new();

        let report = run(&config, &evaluator, Report::new(), &mut progress).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(
            String::from_utf8(progress).unwrap(),
            "Processing a.txt .......\nProcessing b.txt .......\n"
        );
    }

    #[test]
    fn test_run_marks_failed_pipelines_in_progress() {
        let (_dir, config) = sample_dir(&[("a.txt", &b"abc"[..])]);
        let evaluator = Evaluator::new(LibraryZopfli, RefusingCompressor, fast_params());
        let mut progress = Vec::new();

        let report = run(&config, &evaluator, Report::new(), &mut progress).unwrap();

        assert_eq!(String::from_utf8(progress).unwrap(), "Processing a.txt ....xxx\n");
        let row = &report.rows()[0];
        assert_eq!(row.get(Pipeline::Raw), Some(3));
        assert_eq!(row.get(Pipeline::Brotli), None);
    }

    #[test]
    fn test_missing_input_is_fatal_io_error() {
        let (_dir, mut config) = sample_dir(&[("a.txt", &b"abc"[..])]);
        config.files.push("missing.bin".to_string());
        let evaluator = Evaluator::new(LibraryZopfli, BrotliCompressor::default(), fast_params());

        let err = run(&config, &evaluator, Report::new(), &mut std::io::sink()).unwrap_err();
        match err {
            AssetRatioError::Io { path, .. } => assert!(path.ends_with("missing.bin")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_input_is_rejected() {
        let (_dir, mut config) = sample_dir(&[("big.bin", &[0u8; 64][..])]);
        config.max_input_bytes = 16;
        let evaluator = Evaluator::new(LibraryZopfli, BrotliCompressor::default(), fast_params());

        let err = run(&config, &evaluator, Report::new(), &mut std::io::sink()).unwrap_err();
        assert!(matches!(err, AssetRatioError::InputTooLarge { size: 64, limit: 16, .. }));
    }

    #[test]
    fn test_persist_overwrites_previous_report() {
        let (dir, config) = sample_dir(&[("a.txt", &b"abc"[..])]);
        let out = dir.path().join("out.csv");
        fs::write(&out, "stale contents that are longer than the new report ...").unwrap();

        let evaluator = Evaluator::new(LibraryZopfli, BrotliCompressor::default(), fast_params());
        let report = run(&config, &evaluator, Report::new(), &mut std::io::sink()).unwrap();
        persist(&report, &out, ReportFormat::Csv).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert!(written.starts_with("filename,raw,"));
        assert!(!written.contains("stale"));
    }

    #[test]
    fn test_persist_to_missing_directory_is_fatal() {
        let report = Report::new();
        let err = persist(&report, Path::new("/nonexistent-dir/report.csv"), ReportFormat::Csv)
            .unwrap_err();
        assert!(matches!(err, AssetRatioError::Io { .. }));
        assert!(err.is_fatal());
    }
}
