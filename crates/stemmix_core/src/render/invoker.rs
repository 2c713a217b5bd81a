//! Render engine subprocess runner.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::graph::FilterGraph;
use crate::models::{RenderOutcome, RenderSettings, StemInput};

use super::args::{format_args_pretty, RenderArgsBuilder, DEFAULT_MP3_BITRATE};
use super::cancel::CancelHandle;
use super::types::{RenderError, RenderOutput, RenderResult};

/// How long to wait for the stderr reader after the engine exits.
const STDERR_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Runs the render engine for one graph at a time.
///
/// Safe to share between concurrent jobs; every call spawns its own
/// subprocess and owns its own stderr buffer.
#[derive(Debug)]
pub struct RenderInvoker {
    engine_path: PathBuf,
    mp3_bitrate: String,
    timeout: Option<Duration>,
    spawns: AtomicUsize,
}

/// What ended the wait on the engine.
enum WaitEvent {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut(Duration),
}

impl RenderInvoker {
    /// Create an invoker for the given engine executable.
    pub fn new(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            mp3_bitrate: DEFAULT_MP3_BITRATE.to_string(),
            timeout: None,
            spawns: AtomicUsize::new(0),
        }
    }

    /// Kill the engine if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bitrate passed for mp3 output.
    pub fn with_mp3_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.mp3_bitrate = bitrate.into();
        self
    }

    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// How many engine subprocesses this invoker has attempted to start.
    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    /// Assemble the argument list without running anything.
    pub fn build_args(
        &self,
        graph: &FilterGraph,
        stems: &[StemInput],
        settings: &RenderSettings,
        output_path: &Path,
    ) -> Vec<OsString> {
        RenderArgsBuilder::new(graph, stems, settings, output_path)
            .mp3_bitrate(&self.mp3_bitrate)
            .build()
    }

    /// Render `graph` over `stems` into `output_path`.
    pub async fn render(
        &self,
        graph: &FilterGraph,
        stems: &[StemInput],
        settings: &RenderSettings,
        output_path: &Path,
    ) -> RenderOutcome {
        self.render_with_cancel(graph, stems, settings, output_path, &CancelHandle::new())
            .await
    }

    /// Render, terminating the engine if `cancel` fires.
    pub async fn render_with_cancel(
        &self,
        graph: &FilterGraph,
        stems: &[StemInput],
        settings: &RenderSettings,
        output_path: &Path,
        cancel: &CancelHandle,
    ) -> RenderOutcome {
        match self.execute(graph, stems, settings, output_path, cancel).await {
            Ok(output) => RenderOutcome::success(output.output_path),
            Err(e) => e.into(),
        }
    }

    /// Run the engine and return details of the run.
    ///
    /// Settings and graph are checked before spawning, so invalid requests
    /// never start a subprocess.
    pub async fn execute(
        &self,
        graph: &FilterGraph,
        stems: &[StemInput],
        settings: &RenderSettings,
        output_path: &Path,
        cancel: &CancelHandle,
    ) -> RenderResult<RenderOutput> {
        settings.validate()?;

        if graph.input_count() != stems.len() {
            return Err(RenderError::GraphMismatch {
                expected: graph.input_count(),
                actual: stems.len(),
            });
        }

        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled {
                diagnostic: Vec::new(),
            });
        }

        let args = self.build_args(graph, stems, settings, output_path);
        let command_line = format_args_pretty(&self.engine_path, &args);

        let mut cmd = Command::new(&self.engine_path);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running render engine: {}", command_line);

        let started = Instant::now();
        self.spawns.fetch_add(1, Ordering::SeqCst);
        let mut child = cmd.spawn().map_err(|e| RenderError::Launch {
            tool: self.engine_path.display().to_string(),
            source: e,
        })?;

        // Engine progress goes to stderr; keep reading so the pipe never fills.
        let stderr_buf = Arc::new(Mutex::new(Vec::<u8>::new()));
        let mut reader = match child.stderr.take() {
            Some(mut stderr) => {
                let buf = Arc::clone(&stderr_buf);
                Some(tokio::spawn(async move {
                    let mut chunk = [0u8; 8192];
                    loop {
                        match stderr.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => buf.lock().extend_from_slice(&chunk[..n]),
                        }
                    }
                }))
            }
            None => None,
        };

        let deadline = self.timeout;
        let event = tokio::select! {
            status = child.wait() => WaitEvent::Exited(status),
            _ = cancel.cancelled() => WaitEvent::Cancelled,
            _ = sleep_or_forever(deadline) => {
                WaitEvent::TimedOut(deadline.unwrap_or_default())
            }
        };

        if !matches!(event, WaitEvent::Exited(_)) {
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill render engine: {}", e);
            }
        }

        if let Some(handle) = reader.as_mut() {
            if tokio::time::timeout(STDERR_DRAIN_GRACE, &mut *handle)
                .await
                .is_err()
            {
                tracing::warn!("Render engine stderr did not close; truncating diagnostics");
                handle.abort();
            }
        }

        let diagnostics = std::mem::take(&mut *stderr_buf.lock());
        let elapsed = started.elapsed();

        match event {
            WaitEvent::Cancelled => {
                tracing::info!("Render cancelled after {:.1}s", elapsed.as_secs_f64());
                Err(RenderError::Cancelled {
                    diagnostic: diagnostics,
                })
            }
            WaitEvent::TimedOut(after) => {
                tracing::warn!("Render timed out after {:.1}s", after.as_secs_f64());
                Err(RenderError::TimedOut {
                    after,
                    diagnostic: diagnostics,
                })
            }
            WaitEvent::Exited(status) => {
                let status = status.map_err(|e| RenderError::io_error("waiting for render engine", e))?;

                if !status.success() {
                    let exit_code = status.code().unwrap_or(-1);
                    tracing::error!("Render engine failed with exit code {}", exit_code);
                    return Err(RenderError::Engine {
                        exit_code,
                        diagnostic: diagnostics,
                    });
                }

                verify_output(output_path).await?;

                tracing::debug!(
                    "Render engine finished in {:.2}s: {}",
                    elapsed.as_secs_f64(),
                    output_path.display()
                );

                Ok(RenderOutput {
                    output_path: output_path.to_path_buf(),
                    exit_code: 0,
                    command: command_line,
                    diagnostics: String::from_utf8_lossy(&diagnostics).into_owned(),
                    elapsed,
                })
            }
        }
    }
}

async fn sleep_or_forever(timeout: Option<Duration>) {
    match timeout {
        Some(after) => tokio::time::sleep(after).await,
        None => std::future::pending::<()>().await,
    }
}

/// A zero exit only counts once the output exists and is non-empty.
async fn verify_output(path: &Path) -> RenderResult<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(RenderError::Integrity {
            path: path.to_path_buf(),
        }),
    }
}
