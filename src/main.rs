// In: src/main.rs

//! Command-line entry point for the asset-ratio harness.
//!
//! Settings are layered: built-in defaults, then an optional JSON config file,
//! then any flags given on the command line.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use asset_ratio::{AssetRatioError, BenchConfig, DeflateBackend, ReportFormat};
use clap::{ArgAction, Parser, ValueEnum};
use colored::*;
use log::LevelFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    External,
    Library,
}

/// Measure deflate, brotli and base64 pipeline sizes for a set of sample files.
#[derive(Debug, Parser)]
#[command(name = "asset-ratio", version = asset_ratio::VERSION)]
struct Cli {
    /// Sample files, relative to the input directory. Defaults to the built-in list.
    files: Vec<String>,

    /// JSON config file. Flags given here override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the sample files are read from.
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Report destination. Overwritten on every run.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// How the deflate-class compressor is run.
    #[arg(long, value_enum)]
    deflate_backend: Option<BackendArg>,

    /// zopfli program for the external backend.
    #[arg(long, value_name = "PROGRAM")]
    zopfli: Option<String>,

    /// zopfli iterations for deflate stages over raw file bytes.
    #[arg(long, value_name = "N")]
    iterations: Option<u32>,

    /// zopfli iterations for deflate stages over base64 text.
    #[arg(long, value_name = "N")]
    encoded_iterations: Option<u32>,

    /// Brotli quality, 0-11.
    #[arg(long, value_name = "Q")]
    quality: Option<u32>,

    /// Limit for a single external zopfli run.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn resolve_config(&self) -> Result<BenchConfig, AssetRatioError> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_json_file(path)?,
            None => BenchConfig::default(),
        };

        if !self.files.is_empty() {
            config.files = self.files.clone();
        }
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(format) = self.format {
            config.format = match format {
                FormatArg::Csv => ReportFormat::Csv,
                FormatArg::Json => ReportFormat::Json,
            };
        }
        if let Some(backend) = self.deflate_backend {
            config.deflate.backend = match backend {
                BackendArg::External => DeflateBackend::External,
                BackendArg::Library => DeflateBackend::Library,
            };
        }
        if let Some(program) = &self.zopfli {
            config.deflate.program = program.clone();
        }
        if let Some(n) = self.iterations {
            config.deflate.file_iterations = n;
        }
        if let Some(n) = self.encoded_iterations {
            config.deflate.encoded_iterations = n;
        }
        if let Some(q) = self.quality {
            config.brotli.quality = q;
        }
        if let Some(secs) = self.timeout_secs {
            config.deflate.timeout_secs = secs;
        }

        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();

    // Just the level and message, to stderr so it never mixes into progress.
    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));

    let _ = builder.try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = cli.resolve_config().and_then(|config| {
        let stdout = std::io::stdout();
        let mut progress = stdout.lock();
        asset_ratio::run_to_output(&config, &mut progress).map(|report| (config, report))
    });

    match result {
        Ok((config, report)) => {
            let incomplete = report.rows().iter().filter(|r| !r.is_complete()).count();
            if incomplete > 0 {
                eprintln!(
                    "{} {} file(s) have missing measurements",
                    "warning:".yellow().bold(),
                    incomplete
                );
            }
            println!(
                "{}",
                format!("Report saved to {}", config.output_path.display()).green()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
