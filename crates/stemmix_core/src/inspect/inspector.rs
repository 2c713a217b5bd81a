//! Probe subprocess runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::process::Command;

use crate::models::AudioMetadata;

use super::parse::{is_json_document, parse_probe_output};
use super::types::{InspectError, InspectResult};

/// Reads container/stream headers of audio files with the probe tool.
///
/// Holds no state besides its configuration and a spawn counter, so one
/// inspector can be shared across concurrent jobs.
#[derive(Debug)]
pub struct AudioInspector {
    /// Probe executable (name on PATH or absolute path).
    probe_path: PathBuf,
    /// Number of probe subprocesses started.
    spawns: AtomicUsize,
}

impl AudioInspector {
    /// Create an inspector that runs the given probe executable.
    pub fn new(probe_path: impl Into<PathBuf>) -> Self {
        Self {
            probe_path: probe_path.into(),
            spawns: AtomicUsize::new(0),
        }
    }

    /// Configured probe executable.
    pub fn probe_path(&self) -> &Path {
        &self.probe_path
    }

    /// How many probe subprocesses this inspector has attempted to start.
    pub fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }

    /// Inspect one file.
    ///
    /// Spawns exactly one short-lived probe process; never writes to disk.
    pub async fn inspect(&self, path: &Path) -> InspectResult<AudioMetadata> {
        let file_size_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|_| InspectError::FileNotFound(path.to_path_buf()))?
            .len();

        let mut cmd = Command::new(&self.probe_path);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Running probe: {:?}", cmd.as_std());

        self.spawns.fetch_add(1, Ordering::SeqCst);
        let output = cmd.output().await.map_err(|e| InspectError::Launch {
            tool: self.probe_path.display().to_string(),
            source: e,
        })?;

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);

            // An empty document on failure means the input itself was rejected.
            if is_json_document(&output.stdout) {
                tracing::debug!(
                    "Probe rejected {} (exit code {}): no decodable streams",
                    path.display(),
                    exit_code
                );
                return Err(InspectError::MetadataParse(format!(
                    "no audio stream found in {} (probe exit code {})",
                    path.display(),
                    exit_code
                )));
            }

            return Err(InspectError::ProbeFailed {
                exit_code,
                stderr: output.stderr,
            });
        }

        let meta = parse_probe_output(&output.stdout, file_size_bytes)?;

        tracing::debug!(
            "Inspected {}: {} Hz, {}-bit, {} ch, {:.2}s ({})",
            path.display(),
            meta.sample_rate_hz,
            meta.bit_depth,
            meta.channels,
            meta.duration_seconds,
            meta.container_format
        );

        Ok(meta)
    }

    /// Inspect several files in order, stopping at the first failure.
    pub async fn inspect_all<'a, I>(&self, paths: I) -> InspectResult<Vec<AudioMetadata>>
    where
        I: IntoIterator<Item = &'a Path>,
    {
        let mut results = Vec::new();
        for path in paths {
            results.push(self.inspect(path).await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_fails_without_spawning() {
        let inspector = AudioInspector::new("ffprobe");
        let err = inspector
            .inspect(Path::new("/nonexistent/stem.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, InspectError::FileNotFound(_)));
        assert_eq!(inspector.spawn_count(), 0);
    }

    #[tokio::test]
    async fn missing_probe_binary_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("stem.wav");
        std::fs::write(&input, b"RIFF").unwrap();

        let inspector = AudioInspector::new(dir.path().join("no-such-ffprobe"));
        let err = inspector.inspect(&input).await.unwrap_err();
        assert!(matches!(err, InspectError::Launch { .. }));
        assert_eq!(err.kind(), crate::models::FailureKind::Launch);
        assert_eq!(inspector.spawn_count(), 1);
    }
}
