//! End-to-end runs of the harness over real sample files in a temp directory.
//!
//! These use the in-process zopfli backend so they need no binary on PATH. The
//! external backend is covered at the bottom and skips when `zopfli` is absent.
//!
//! Run with: cargo test --test end_to_end -- --nocapture

use std::fs;

use asset_ratio::kernels::{base64, brotli, deflate};
use asset_ratio::{
    run_to_output, BenchConfig, DeflateBackend, DeflateConfig, Pipeline, Report, ReportFormat,
};
use tempfile::TempDir;

fn config_for(dir: &TempDir, files: &[(&str, Vec<u8>)]) -> BenchConfig {
    for (name, bytes) in files {
        fs::write(dir.path().join(name), bytes).unwrap();
    }
    BenchConfig {
        input_dir: dir.path().to_path_buf(),
        output_path: dir.path().join("report.csv"),
        files: files.iter().map(|(name, _)| name.to_string()).collect(),
        deflate: DeflateConfig {
            backend: DeflateBackend::Library,
            file_iterations: 5,
            encoded_iterations: 5,
            ..DeflateConfig::default()
        },
        ..BenchConfig::default()
    }
}

/// Pseudo-random bytes from a fixed LCG, so runs are reproducible.
fn noisy_bytes(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

fn sample_files() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("empty.bin", Vec::new()),
        ("aaaa.bin", vec![b'a'; 10_000]),
        ("loss.svg", b"<svg><path d=\"M0 0L10 10\"/></svg>\n".repeat(50)),
        ("noise.bin", noisy_bytes(4096)),
    ]
}

#[test]
fn test_report_has_one_row_per_file_and_eight_columns() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &sample_files());

    let report = run_to_output(&config, &mut std::io::sink()).unwrap();
    assert_eq!(report.len(), 4);

    let csv = fs::read_to_string(&config.output_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        "filename,raw,deflate,base64 + deflate,deflate + base64 + deflate,brotli,base64 + brotli,brotli + base64 + brotli"
    );
    for line in &lines {
        assert_eq!(line.split(',').count(), 8, "bad line: {}", line);
    }
    let names: Vec<&str> = lines[1..].iter().map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(names, vec!["empty.bin", "aaaa.bin", "loss.svg", "noise.bin"]);
}

#[test]
fn test_two_runs_produce_identical_reports() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &sample_files());

    run_to_output(&config, &mut std::io::sink()).unwrap();
    let first = fs::read(&config.output_path).unwrap();
    run_to_output(&config, &mut std::io::sink()).unwrap();
    let second = fs::read(&config.output_path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_raw_column_matches_file_sizes() {
    let dir = TempDir::new().unwrap();
    let files = sample_files();
    let config = config_for(&dir, &files);

    let report = run_to_output(&config, &mut std::io::sink()).unwrap();
    for (row, (_, bytes)) in report.rows().iter().zip(&files) {
        assert_eq!(row.get(Pipeline::Raw), Some(bytes.len()));
        assert!(row.is_complete());
    }
}

#[test]
fn test_empty_file_base64_pipelines_equal_plain_compression() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, &[("empty.bin", Vec::new())]);

    let report = run_to_output(&config, &mut std::io::sink()).unwrap();
    let row = &report.rows()[0];
    assert_eq!(row.get(Pipeline::Raw), Some(0));
    assert!(row.get(Pipeline::Deflate).unwrap() > 0);
    assert!(row.get(Pipeline::Brotli).unwrap() > 0);
    assert_eq!(row.get(Pipeline::Base64Deflate), row.get(Pipeline::Deflate));
    assert_eq!(row.get(Pipeline::Base64Brotli), row.get(Pipeline::Brotli));
}

#[test]
fn test_three_stage_sizes_come_from_compressed_intermediate() {
    let dir = TempDir::new().unwrap();
    let data = noisy_bytes(2048);
    let config = config_for(&dir, &[("noise.bin", data.clone())]);

    let report = run_to_output(&config, &mut std::io::sink()).unwrap();
    let row = &report.rows()[0];

    let compressor = BenchConfig::default().brotli;
    let once = brotli::compress(&data, compressor.quality, compressor.lgwin).unwrap();
    let expected = brotli::compress(&base64::encode(&once), compressor.quality, compressor.lgwin)
        .unwrap()
        .len();
    let from_raw = brotli::compress(&base64::encode(&data), compressor.quality, compressor.lgwin)
        .unwrap()
        .len();

    assert_eq!(row.get(Pipeline::BrotliBase64Brotli), Some(expected));
    assert_eq!(row.get(Pipeline::Base64Brotli), Some(from_raw));
}

#[test]
fn test_compressed_outputs_roundtrip() {
    for (_, data) in sample_files() {
        let z = asset_ratio::kernels::LibraryZopfli;
        let zlib = asset_ratio::Compressor::compress(&z, &data, 5).unwrap();
        assert_eq!(deflate::decompress_zlib(&zlib).unwrap(), data);

        let br = brotli::compress(&data, 11, 22).unwrap();
        assert_eq!(brotli::decompress(&br).unwrap(), data);

        assert_eq!(base64::decode(&base64::encode(&data)).unwrap(), data);
    }
}

#[test]
fn test_json_report_format() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&dir, &[("aaaa.bin", vec![b'a'; 1000])]);
    config.format = ReportFormat::Json;
    config.output_path = dir.path().join("report.json");

    run_to_output(&config, &mut std::io::sink()).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config.output_path).unwrap()).unwrap();
    assert_eq!(value[0]["filename"], "aaaa.bin");
    assert_eq!(value[0]["raw"], 1000);
}

#[test]
fn test_invalid_config_is_rejected_before_running() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&dir, &[("a.bin", vec![1, 2, 3])]);
    config.brotli.quality = 42;

    assert!(run_to_output(&config, &mut std::io::sink()).is_err());
    assert!(!config.output_path.exists());
}

#[test]
fn test_external_backend_matches_report_shape() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&dir, &[("aaaa.bin", vec![b'a'; 10_000])]);
    config.deflate.backend = DeflateBackend::External;

    let probe = deflate::ExternalZopfli::new(&config.deflate);
    if !probe.is_available() {
        eprintln!("SKIP: zopfli not available");
        return;
    }

    let report: Report = run_to_output(&config, &mut std::io::sink()).unwrap();
    let row = &report.rows()[0];
    assert!(row.is_complete());
    assert!(row.get(Pipeline::Deflate).unwrap() < 100);
}

#[test]
fn test_missing_external_tool_aborts_run() {
    let dir = TempDir::new().unwrap();
    let mut config = config_for(&dir, &[("a.bin", vec![1, 2, 3])]);
    config.deflate.backend = DeflateBackend::External;
    config.deflate.program = "no-such-zopfli-binary".to_string();

    let err = run_to_output(&config, &mut std::io::sink()).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("a.bin"));
    assert!(!config.output_path.exists());
}
