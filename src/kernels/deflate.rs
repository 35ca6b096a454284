//! This module contains the deflate-class compressor adapters. Both produce a
//! zlib container tuned by zopfli's iteration count.
//!
//! Two backends are provided:
//! 1.  `ExternalZopfli` spawns the `zopfli` command-line tool. The payload is
//!     handed over through a scoped temp file and the compressed stream is read
//!     from the child's stdout. The child runs under a wall-clock timeout.
//! 2.  `LibraryZopfli` runs the `zopfli` crate in-process with the same
//!     parameters.
//!
//! Any failure of the external tool is reported as `ExternalTool`, which aborts
//! the run. The tool is required infrastructure, not an optional measurement.

use std::io::{ErrorKind, Read, Write};
use std::num::NonZeroU64;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use flate2::read::ZlibDecoder;
use tempfile::NamedTempFile;

use crate::config::DeflateConfig;
use crate::error::AssetRatioError;
use crate::kernels::Compressor;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

//==================================================================================
// 1. External Process Backend
//==================================================================================

/// Runs `<program> --zlib -c --i<N> <tempfile>` for every compression.
#[derive(Debug, Clone)]
pub struct ExternalZopfli {
    program: String,
    timeout: Duration,
}

impl ExternalZopfli {
    pub fn new(config: &DeflateConfig) -> Self {
        Self {
            program: config.program.clone(),
            timeout: config.timeout(),
        }
    }

    /// Returns true when the configured program can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-h")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    fn spawn(&self, input_path: &std::path::Path, iterations: u32) -> Result<Child, AssetRatioError> {
        Command::new(&self.program)
            .arg("--zlib")
            .arg("-c")
            .arg(format!("--i{}", iterations))
            .arg(input_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    AssetRatioError::ExternalTool(format!("'{}' not found on PATH", self.program))
                }
                _ => AssetRatioError::ExternalTool(format!(
                    "failed to start '{}': {}",
                    self.program, e
                )),
            })
    }
}

impl Compressor for ExternalZopfli {
    fn name(&self) -> &'static str {
        "zopfli"
    }

    fn compress(&self, input: &[u8], effort: u32) -> Result<Vec<u8>, AssetRatioError> {
        if effort == 0 {
            return Err(AssetRatioError::Compression(
                "zopfli iteration count must be at least 1".to_string(),
            ));
        }

        // The temp file is removed when `scratch` drops, on every return path.
        let mut scratch = NamedTempFile::new()
            .map_err(|e| AssetRatioError::ExternalTool(format!("cannot create temp file: {}", e)))?;
        scratch
            .write_all(input)
            .and_then(|_| scratch.flush())
            .map_err(|e| AssetRatioError::io(scratch.path(), e))?;

        let child = self.spawn(scratch.path(), effort)?;
        let output = wait_with_timeout(child, self.timeout, &self.program)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssetRatioError::ExternalTool(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        log::debug!(
            "zopfli --i{}: {} -> {} bytes",
            effort,
            input.len(),
            output.stdout.len()
        );
        Ok(output.stdout)
    }
}

struct ChildOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_pipe(
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    program: &str,
) -> Result<Vec<u8>, AssetRatioError> {
    match handle {
        None => Ok(Vec::new()),
        Some(handle) => handle
            .join()
            .map_err(|_| AssetRatioError::ExternalTool(format!("reader for '{}' panicked", program)))?
            .map_err(|e| AssetRatioError::ExternalTool(format!("reading from '{}': {}", program, e))),
    }
}

/// Waits for `child` to exit, killing it once `timeout` has elapsed.
///
/// Both pipes are drained on helper threads while waiting, so a child that
/// writes more than the pipe buffer cannot stall.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    program: &str,
) -> Result<ChildOutput, AssetRatioError> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let started = Instant::now();

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if started.elapsed() >= timeout => {
                reap(&mut child);
                return Err(AssetRatioError::ExternalTool(format!(
                    "'{}' timed out after {:?}",
                    program, timeout
                )));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                reap(&mut child);
                return Err(AssetRatioError::ExternalTool(format!(
                    "waiting for '{}': {}",
                    program, e
                )));
            }
        }
    };

    Ok(ChildOutput {
        status,
        stdout: join_pipe(stdout, program)?,
        stderr: join_pipe(stderr, program)?,
    })
}

/// Kills `child` and collects its exit status so no zombie is left behind.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

//==================================================================================
// 2. In-Process Library Backend
//==================================================================================

/// Runs the `zopfli` crate with a zlib container.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryZopfli;

impl Compressor for LibraryZopfli {
    fn name(&self) -> &'static str {
        "zopfli-lib"
    }

    fn compress(&self, input: &[u8], effort: u32) -> Result<Vec<u8>, AssetRatioError> {
        let iteration_count = NonZeroU64::new(u64::from(effort)).ok_or_else(|| {
            AssetRatioError::Compression("zopfli iteration count must be at least 1".to_string())
        })?;

        let mut options = zopfli::Options::default();
        options.iteration_count = iteration_count;

        let mut output_buf = Vec::with_capacity(input.len() / 2 + 16);
        zopfli::compress(options, zopfli::Format::Zlib, input, &mut output_buf)
            .map_err(|e| AssetRatioError::Compression(format!("zopfli: {}", e)))?;
        Ok(output_buf)
    }
}

//==================================================================================
// 3. Verification
//==================================================================================

/// Inflates a zlib stream produced by either backend.
pub fn decompress_zlib(input_bytes: &[u8]) -> Result<Vec<u8>, AssetRatioError> {
    let mut decoder = ZlibDecoder::new(input_bytes);
    let mut output_buf = Vec::new();
    decoder
        .read_to_end(&mut output_buf)
        .map_err(|e| AssetRatioError::Compression(format!("zlib decode: {}", e)))?;
    Ok(output_buf)
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
