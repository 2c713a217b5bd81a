//! End-to-end renders with the real engine and probe.
//!
//! Tests that need the tools return early when `ffmpeg`/`ffprobe` are not
//! on PATH.

mod common;

use std::sync::Arc;

use common::{dir_entries, tools_available, write_wav};
use stemmix_core::inspect::AudioInspector;
use stemmix_core::models::{
    ContainerFormat, EffectSpec, FailureKind, JobStatus, RenderJob, RenderSettings, StemInput,
};
use stemmix_core::orchestrator::MixOrchestrator;
use stemmix_core::render::RenderInvoker;
use stemmix_core::report::JobResultReporter;
use tempfile::TempDir;

fn orchestrator() -> MixOrchestrator {
    MixOrchestrator::new(
        Arc::new(AudioInspector::new("ffprobe")),
        Arc::new(RenderInvoker::new("ffmpeg")),
    )
}

macro_rules! require_tools {
    () => {
        if !tools_available().await {
            eprintln!("skipping: ffmpeg/ffprobe not available");
            return;
        }
    };
}

#[tokio::test]
async fn two_stems_render_to_wav() {
    require_tools!();

    let dir = TempDir::new().unwrap();
    let drums = dir.path().join("drums.wav");
    let bass = dir.path().join("bass.wav");
    write_wav(&drums, 44100, 1, 1000).unwrap();
    write_wav(&bass, 44100, 2, 500).unwrap();

    let out_dir = dir.path().join("mixes");
    let output = out_dir.join("song.wav");
    let job = RenderJob::new(
        vec![
            StemInput::new(&drums).with_gain(0.8),
            StemInput::new(&bass).with_gain(0.5),
        ],
        RenderSettings::new(44100, 16, ContainerFormat::Wav),
        &output,
    );

    let orch = orchestrator();
    let outcome = orch.render_mix(&job).await;
    assert!(outcome.is_success(), "{:?}", outcome);
    assert_eq!(dir_entries(&out_dir), vec!["song.wav"]);

    let meta = orch.inspector().inspect(&output).await.unwrap();
    assert_eq!(meta.sample_rate_hz, 44100);
    assert_eq!(meta.bit_depth, 16);
    assert_eq!(meta.channels, 2);
    assert!(meta.duration_seconds > 0.9, "duration {}", meta.duration_seconds);

    let update = JobResultReporter::new().report(&outcome);
    assert_eq!(update.status, JobStatus::Completed);
    assert_eq!(update.result_path.as_deref(), output.to_str());
}

#[tokio::test]
async fn single_stem_renders_to_flac() {
    require_tools!();

    let dir = TempDir::new().unwrap();
    let vocals = dir.path().join("vocals.wav");
    write_wav(&vocals, 48000, 2, 300).unwrap();

    let output = dir.path().join("vocals_only.flac");
    let job = RenderJob::new(
        vec![StemInput::new(&vocals)
            .with_effect(EffectSpec::Gain { db: -3.0 })
            .with_effect(EffectSpec::Pan { position: 0.25 })],
        RenderSettings::new(48000, 24, ContainerFormat::Flac),
        &output,
    );

    let orch = orchestrator();
    let outcome = orch.render_mix(&job).await;
    assert!(outcome.is_success(), "{:?}", outcome);

    let meta = orch.inspector().inspect(&output).await.unwrap();
    assert_eq!(meta.sample_rate_hz, 48000);
    assert_eq!(meta.codec.as_deref(), Some("flac"));
}

#[tokio::test]
async fn missing_stem_is_engine_failure() {
    require_tools!();

    let dir = TempDir::new().unwrap();
    let present = dir.path().join("drums.wav");
    write_wav(&present, 44100, 2, 200).unwrap();

    let out_dir = dir.path().join("mixes");
    let job = RenderJob::new(
        vec![
            StemInput::new(&present),
            StemInput::new(dir.path().join("missing.wav")),
        ],
        RenderSettings::default(),
        out_dir.join("song.wav"),
    );

    let outcome = orchestrator().render_mix(&job).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::Engine));
    assert!(outcome.diagnostic_text().unwrap().contains("missing.wav"));
    assert!(dir_entries(&out_dir).is_empty());

    let update = JobResultReporter::new().report(&outcome);
    assert_eq!(update.status, JobStatus::Failed);
    assert!(update.error_message.unwrap().contains("missing.wav"));
}

#[tokio::test]
async fn text_file_is_not_audio() {
    require_tools!();

    let dir = TempDir::new().unwrap();
    let fake = dir.path().join("notes.wav");
    std::fs::write(&fake, "these are not samples\n").unwrap();

    let err = AudioInspector::new("ffprobe").inspect(&fake).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::MetadataParse);
}

#[tokio::test]
async fn preflight_rejects_unreadable_stem_before_render() {
    require_tools!();

    let dir = TempDir::new().unwrap();
    let fake = dir.path().join("notes.wav");
    std::fs::write(&fake, "these are not samples\n").unwrap();

    let orch = orchestrator().with_preflight(true);
    let job = RenderJob::new(
        vec![StemInput::new(&fake)],
        RenderSettings::default(),
        dir.path().join("out.wav"),
    );

    let outcome = orch.render_mix(&job).await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::MetadataParse));
    assert_eq!(orch.invoker().spawn_count(), 0);
}

#[tokio::test]
async fn unsupported_effect_never_spawns() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("mixes");
    let job = RenderJob::new(
        vec![
            StemInput::new("drums.wav"),
            StemInput::new("bass.wav").with_effect(EffectSpec::unknown("sidechain")),
        ],
        RenderSettings::default(),
        out_dir.join("song.wav"),
    );

    let orch = orchestrator();
    let outcome = orch.render_mix(&job).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::UnsupportedEffect));
    assert!(outcome.diagnostic_text().unwrap().contains("sidechain"));
    assert_eq!(orch.invoker().spawn_count(), 0);
    assert_eq!(orch.inspector().spawn_count(), 0);
}
