//! Mix orchestrator - runs one render job end to end.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tempfile::TempPath;

use crate::config::Settings;
use crate::inspect::AudioInspector;
use crate::logging::{JobLogger, LogConfig};
use crate::models::{RenderJob, RenderOutcome, RenderPrefs, RenderSettings, StemInput};
use crate::render::{CancelHandle, RenderInvoker};

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::Pipeline;
use super::step::PipelineStep;
use super::steps::{BuildGraphStep, InspectStep, RenderStep, ValidateStep};
use super::types::{Context, JobState, ProgressCallback};

const STAGING_PREFIX: &str = ".stemmix-";

/// Sequences validate → (inspect) → build graph → render for a job.
///
/// Jobs are independent and may run concurrently as long as their output
/// paths differ; a second job for a path that is still rendering fails
/// with `OutputBusy`. The engine writes into a staging file next to the
/// output, which is renamed into place on success and removed otherwise.
pub struct MixOrchestrator {
    inspector: Arc<AudioInspector>,
    invoker: Arc<RenderInvoker>,
    preflight: bool,
    log_dir: Option<PathBuf>,
    log_config: LogConfig,
    show_command_pretty: bool,
    /// Fallback render preferences (from config).
    defaults: RenderPrefs,
    active_outputs: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MixOrchestrator {
    pub fn new(inspector: Arc<AudioInspector>, invoker: Arc<RenderInvoker>) -> Self {
        Self {
            inspector,
            invoker,
            preflight: false,
            log_dir: None,
            log_config: LogConfig::default(),
            show_command_pretty: false,
            defaults: RenderPrefs::default(),
            active_outputs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Build the inspector, invoker and logging setup from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let inspector = AudioInspector::new(&settings.tools.ffprobe_path);
        let invoker = RenderInvoker::new(&settings.tools.ffmpeg_path)
            .with_mp3_bitrate(settings.render.mp3_bitrate.clone())
            .with_timeout(settings.render.timeout());

        let log_dir = settings
            .logging
            .write_job_logs
            .then(|| PathBuf::from(&settings.paths.logs_folder));

        Self::new(Arc::new(inspector), Arc::new(invoker))
            .with_preflight(settings.render.preflight_inspect)
            .with_log_dir(log_dir)
            .with_log_config(settings.logging.to_log_config())
            .with_command_pretty(settings.logging.show_command_pretty)
            .with_defaults(settings.render.as_prefs())
    }

    /// Fallback preferences for [`resolve_settings`](Self::resolve_settings).
    pub fn with_defaults(mut self, defaults: RenderPrefs) -> Self {
        self.defaults = defaults;
        self
    }

    /// Probe every stem before building the graph.
    pub fn with_preflight(mut self, enabled: bool) -> Self {
        self.preflight = enabled;
        self
    }

    /// Write a log file per job into this directory.
    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn with_log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    pub fn with_command_pretty(mut self, enabled: bool) -> Self {
        self.show_command_pretty = enabled;
        self
    }

    pub fn inspector(&self) -> &Arc<AudioInspector> {
        &self.inspector
    }

    pub fn invoker(&self) -> &Arc<RenderInvoker> {
        &self.invoker
    }

    /// Resolve render settings for a job from per-job preferences.
    ///
    /// When neither the job nor the defaults pick a sample rate, the first
    /// stem is probed and its rate inherited. A stem that cannot be probed
    /// is left to the render to report; the fallback rate is used instead.
    pub async fn resolve_settings(&self, stems: &[StemInput], prefs: &RenderPrefs) -> RenderSettings {
        let needs_probe = prefs.sample_rate_hz.or(self.defaults.sample_rate_hz).is_none();

        let probed = match stems.first() {
            Some(first) if needs_probe => match self.inspector.inspect(&first.file_path).await {
                Ok(meta) => Some(meta),
                Err(e) => {
                    tracing::warn!(
                        "Could not inspect {} for its sample rate: {}",
                        first.file_path.display(),
                        e
                    );
                    None
                }
            },
            _ => None,
        };

        let settings = RenderSettings::derive(prefs, &self.defaults, probed.as_ref());
        tracing::debug!(
            "Resolved render settings: {} Hz, {}-bit, {}",
            settings.sample_rate_hz,
            settings.bit_depth,
            settings.container_format
        );
        settings
    }

    /// Step list for a job, in execution order.
    pub fn pipeline(&self) -> Pipeline {
        let mut pipeline = Pipeline::new().with_step(ValidateStep);
        if self.preflight {
            pipeline.add_step(InspectStep::new(Arc::clone(&self.inspector)));
        }
        pipeline
            .with_step(BuildGraphStep)
            .with_step(
                RenderStep::new(Arc::clone(&self.invoker))
                    .with_command_pretty(self.show_command_pretty),
            )
    }

    /// Render a job. Every failure comes back as a typed outcome.
    pub async fn render_mix(&self, job: &RenderJob) -> RenderOutcome {
        self.render_mix_with(job, &CancelHandle::new(), None).await
    }

    /// Render a job with cancellation and progress reporting.
    pub async fn render_mix_with(
        &self,
        job: &RenderJob,
        cancel: &CancelHandle,
        progress: Option<ProgressCallback>,
    ) -> RenderOutcome {
        match self.run(job, cancel, progress).await {
            Ok(path) => RenderOutcome::success(path),
            Err(e) => {
                tracing::warn!("Mix job '{}' failed: {}", job.name(), e);
                e.into()
            }
        }
    }

    /// Run the pipeline and move the result into place.
    pub async fn run(
        &self,
        job: &RenderJob,
        cancel: &CancelHandle,
        progress: Option<ProgressCallback>,
    ) -> PipelineResult<PathBuf> {
        let job_name = job.name();
        let output_path = job.output_path.clone();

        // Fail before touching the filesystem
        ValidateStep::check(job)
            .map_err(|e| PipelineError::step_failed(&job_name, ValidateStep.name(), e))?;

        let lease = OutputLease::acquire(&self.active_outputs, &output_path)?;

        let logger = Arc::new(self.job_logger(&job_name, lease.key())?);

        let output_dir = output_dir(&output_path);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| PipelineError::setup_failed(&job_name, "create output directory", e))?;

        // Removed on drop unless persisted
        let staging = staging_file(&output_dir, job)
            .map_err(|e| PipelineError::setup_failed(&job_name, "create staging file", e))?;

        let mut ctx = Context::new(job.clone(), staging.to_path_buf(), Arc::clone(&logger), cancel.clone());
        if let Some(callback) = progress {
            ctx = ctx.with_progress_callback(callback);
        }

        let mut state = JobState::new(&job_name);
        let result = self.pipeline().run(&ctx, &mut state).await;

        match result {
            Ok(run) => {
                staging.persist(&output_path).map_err(|e| {
                    PipelineError::setup_failed(&job_name, "move render into place", e.error)
                })?;
                logger.done(&format!(
                    "Wrote {} ({} steps)",
                    output_path.display(),
                    run.total_steps()
                ));
                Ok(output_path)
            }
            Err(e) => {
                logger.error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Logs are named `<job>-<hash of output>.log`, so jobs whose outputs
    /// share a file name never write the same log.
    fn job_logger(&self, job_name: &str, output_key: &Path) -> PipelineResult<JobLogger> {
        match &self.log_dir {
            Some(dir) => {
                let file_stem = format!("{}-{}", job_name, short_hash(output_key));
                JobLogger::with_file_stem(job_name, dir, &file_stem, self.log_config.clone(), None)
                    .map_err(|e| PipelineError::setup_failed(job_name, "create job log", e))
            }
            None => Ok(JobLogger::detached(job_name, self.log_config.clone(), None)),
        }
    }
}

/// Claim on an output path, released on drop.
struct OutputLease {
    registry: Arc<Mutex<HashSet<PathBuf>>>,
    path: PathBuf,
}

impl OutputLease {
    fn acquire(registry: &Arc<Mutex<HashSet<PathBuf>>>, path: &Path) -> PipelineResult<Self> {
        let key = lease_key(path);
        if !registry.lock().insert(key.clone()) {
            return Err(PipelineError::OutputBusy {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            registry: Arc::clone(registry),
            path: key,
        })
    }

    fn key(&self) -> &Path {
        &self.path
    }
}

impl Drop for OutputLease {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.path);
    }
}

/// Absolute form of the output path with its directory resolved through
/// symlinks when it exists, so `mix.wav`, `./mix.wav` and `$PWD/mix.wav`
/// share one lease.
fn lease_key(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let resolved = match (absolute.parent(), absolute.file_name()) {
        (Some(dir), Some(name)) => std::fs::canonicalize(dir)
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| absolute.clone()),
        _ => absolute.clone(),
    };
    resolved.components().collect()
}

/// First 8 hex digits of the SHA-256 of a path.
fn short_hash(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

fn output_dir(output_path: &Path) -> PathBuf {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Empty, uniquely named file beside the output with the same extension,
/// so the engine picks the same muxer.
fn staging_file(dir: &Path, job: &RenderJob) -> std::io::Result<TempPath> {
    let suffix = format!(".{}", job.settings.container_format.extension());
    let file = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?;
    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EffectSpec, FailureKind, RenderSettings, StemInput};

    fn orchestrator() -> MixOrchestrator {
        MixOrchestrator::new(
            Arc::new(AudioInspector::new("ffprobe")),
            Arc::new(RenderInvoker::new("ffmpeg")),
        )
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect()
    }

    #[tokio::test]
    async fn empty_job_fails_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator();
        let job = RenderJob::new(vec![], RenderSettings::default(), dir.path().join("mix.wav"));

        let outcome = orch.render_mix(&job).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::EmptyStemList));
        assert_eq!(orch.invoker().spawn_count(), 0);
        assert_eq!(orch.inspector().spawn_count(), 0);
        assert!(leftovers(dir.path()).is_empty());

        let nested = RenderJob::new(vec![], RenderSettings::default(), dir.path().join("new").join("mix.wav"));
        orch.render_mix(&nested).await;
        assert!(!dir.path().join("new").exists());
    }

    #[tokio::test]
    async fn unsupported_effect_fails_before_render() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator();
        let job = RenderJob::new(
            vec![StemInput::new("a.wav").with_effect(EffectSpec::unknown("sidechain"))],
            RenderSettings::default(),
            dir.path().join("out").join("mix.wav"),
        );

        let outcome = orch.render_mix(&job).await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::UnsupportedEffect));
        assert!(outcome.diagnostic_text().unwrap().contains("sidechain"));
        assert_eq!(orch.invoker().spawn_count(), 0);
        // Output directory is created, staging file is cleaned up
        assert!(leftovers(&dir.path().join("out")).is_empty());
    }

    #[tokio::test]
    async fn invalid_settings_surface_as_such() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator();
        let job = RenderJob::new(
            vec![StemInput::new("a.wav")],
            RenderSettings::new(44100, 24, crate::models::ContainerFormat::Mp3),
            dir.path().join("mix.mp3"),
        );

        let outcome = orch.render_mix(&job).await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::InvalidSettings));
    }

    #[tokio::test]
    async fn resolve_settings_skips_probe_when_rate_known() {
        let orch = orchestrator().with_defaults(RenderPrefs {
            sample_rate_hz: Some(96000),
            bit_depth: Some(24),
            container_format: Some(crate::models::ContainerFormat::Flac),
        });
        let stems = vec![StemInput::new("/nonexistent/a.wav")];

        let settings = orch.resolve_settings(&stems, &RenderPrefs::default()).await;

        assert_eq!(
            settings,
            RenderSettings::new(96000, 24, crate::models::ContainerFormat::Flac)
        );
        assert_eq!(orch.inspector().spawn_count(), 0);
    }

    #[tokio::test]
    async fn resolve_settings_falls_back_when_probe_fails() {
        let orch = orchestrator();
        let stems = vec![StemInput::new("/nonexistent/a.wav")];

        let settings = orch.resolve_settings(&stems, &RenderPrefs::default()).await;

        assert_eq!(settings.sample_rate_hz, 48000);
        assert_eq!(settings.container_format, crate::models::ContainerFormat::Wav);
    }

    #[test]
    fn lease_rejects_second_holder_until_released() {
        let registry = Arc::new(Mutex::new(HashSet::new()));
        let first = OutputLease::acquire(&registry, Path::new("/mixes/./song.wav")).unwrap();

        let second = OutputLease::acquire(&registry, Path::new("/mixes/song.wav"));
        assert!(matches!(second, Err(PipelineError::OutputBusy { .. })));

        drop(first);
        assert!(OutputLease::acquire(&registry, Path::new("/mixes/song.wav")).is_ok());
    }

    #[test]
    fn relative_and_absolute_outputs_share_a_lease() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            lease_key(Path::new("song.wav")),
            lease_key(&cwd.join("song.wav"))
        );

        let registry = Arc::new(Mutex::new(HashSet::new()));
        let _held = OutputLease::acquire(&registry, Path::new("song.wav")).unwrap();
        let again = OutputLease::acquire(&registry, &cwd.join(".").join("song.wav"));
        assert!(matches!(again, Err(PipelineError::OutputBusy { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_share_a_lease() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        assert_eq!(
            lease_key(&link.join("song.wav")),
            lease_key(&real.join("song.wav"))
        );
    }

    #[test]
    fn log_names_differ_per_output() {
        let a = short_hash(Path::new("/mixes/a/mix.wav"));
        let b = short_hash(Path::new("/mixes/b/mix.wav"));
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
        assert_eq!(a, short_hash(Path::new("/mixes/a/mix.wav")));
    }

    #[test]
    fn pipeline_includes_inspect_only_with_preflight() {
        assert_eq!(
            orchestrator().pipeline().step_names(),
            vec!["Validate", "BuildGraph", "Render"]
        );
        assert_eq!(
            orchestrator().with_preflight(true).pipeline().step_names(),
            vec!["Validate", "Inspect", "BuildGraph", "Render"]
        );
    }

    #[test]
    fn staging_file_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let job = RenderJob::new(
            vec![],
            RenderSettings::new(48000, 24, crate::models::ContainerFormat::Flac),
            dir.path().join("mix.flac"),
        );
        let staging = staging_file(dir.path(), &job).unwrap();
        let name = staging.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(STAGING_PREFIX));
        assert!(name.ends_with(".flac"));

        let path = staging.to_path_buf();
        drop(staging);
        assert!(!path.exists());
    }

    #[test]
    fn relative_output_uses_current_dir() {
        assert_eq!(output_dir(Path::new("mix.wav")), PathBuf::from("."));
        assert_eq!(output_dir(Path::new("a/mix.wav")), PathBuf::from("a"));
    }
}
