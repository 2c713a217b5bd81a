//! stemmix - render multi-stem mixes with an external engine.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use stemmix_core::config::{ConfigManager, Settings};
use stemmix_core::inspect::AudioInspector;
use stemmix_core::logging::{init_tracing, LogConfig, LogLevel};
use stemmix_core::models::{JobStatus, RenderJob, RenderPrefs, StemInput};
use stemmix_core::orchestrator::{MixOrchestrator, ProgressCallback};
use stemmix_core::render::CancelHandle;
use stemmix_core::report::JobResultReporter;

#[derive(Parser)]
#[command(name = "stemmix")]
#[command(version, about = "Render multi-stem audio mixes", long_about = None)]
struct Cli {
    /// Settings file path
    #[arg(short, long, global = true, env = "STEMMIX_CONFIG", default_value = "stemmix.toml")]
    config: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the metadata of an audio file as JSON
    Inspect {
        /// Audio file to probe
        file: PathBuf,
    },
    /// Render a job description and print its status update as JSON
    Render {
        /// Job description (JSON)
        job: PathBuf,
    },
    /// Write a settings file with default values
    InitConfig,
}

/// Job description as read from disk.
///
/// `settings` fields are optional; missing ones come from the config file
/// or, for the sample rate, from the first stem.
#[derive(Debug, Deserialize)]
struct JobFile {
    stems: Vec<StemInput>,
    output_path: PathBuf,
    #[serde(default)]
    settings: RenderPrefs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    });

    match cli.command {
        Commands::Inspect { file } => {
            let settings = load_settings(&cli.config)?;
            inspect(&settings, &file).await?;
        }
        Commands::Render { job } => {
            let settings = load_settings(&cli.config)?;
            let completed = render(&settings, &job, cli.verbose).await?;
            if !completed {
                std::process::exit(1);
            }
        }
        Commands::InitConfig => {
            let mut manager = ConfigManager::new(&cli.config);
            manager
                .load_or_create()
                .with_context(|| format!("writing {}", cli.config.display()))?;
            println!("{}", manager.path().display());
        }
    }

    Ok(())
}

/// Settings from the config file, or defaults if there is none.
fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(Settings::default());
    }
    let mut manager = ConfigManager::new(path);
    manager
        .load()
        .with_context(|| format!("loading {}", path.display()))?;
    Ok(manager.settings().clone())
}

async fn inspect(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let inspector = AudioInspector::new(&settings.tools.ffprobe_path);
    let meta = inspector
        .inspect(file)
        .await
        .with_context(|| format!("inspecting {}", file.display()))?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

/// Returns whether the job completed.
async fn render(settings: &Settings, job_path: &Path, verbose: bool) -> anyhow::Result<bool> {
    let content = tokio::fs::read_to_string(job_path)
        .await
        .with_context(|| format!("reading {}", job_path.display()))?;
    let job_file: JobFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", job_path.display()))?;

    let mut orchestrator = MixOrchestrator::from_settings(settings);
    if verbose {
        orchestrator = orchestrator.with_log_config(LogConfig::verbose());
    }
    let render_settings = orchestrator
        .resolve_settings(&job_file.stems, &job_file.settings)
        .await;

    let output_path = settings.paths.resolve_output(&job_file.output_path);
    let job = RenderJob::new(job_file.stems, render_settings, output_path);

    let cancel = CancelHandle::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling render");
            on_interrupt.cancel();
        }
    });

    let progress: ProgressCallback = Box::new(|step, percent, _message| {
        tracing::info!("[{:>3}%] {}", percent, step);
    });

    let outcome = orchestrator
        .render_mix_with(&job, &cancel, Some(progress))
        .await;
    let update = JobResultReporter::new().report(&outcome);

    println!("{}", serde_json::to_string_pretty(&update)?);
    Ok(update.status == JobStatus::Completed)
}
