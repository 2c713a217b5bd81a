//! Settings tables and their defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;
use crate::models::{ContainerFormat, RenderPrefs};
use crate::render::DEFAULT_MP3_BITRATE;

/// One field per `[table]` in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub tools: ToolSettings,

    #[serde(default)]
    pub render: RenderDefaults,

    /// Output and log directories.
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Locations of the render engine and probe executables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Render engine (name on PATH or absolute path).
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// Probe tool (name on PATH or absolute path).
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

/// Defaults applied when a job does not pin its own render settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDefaults {
    /// Container used when a job names none.
    #[serde(default)]
    pub default_format: ContainerFormat,

    #[serde(default = "default_bit_depth")]
    pub default_bit_depth: u16,

    /// Unset means "inherit from the first stem".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sample_rate: Option<u32>,

    #[serde(default = "default_mp3_bitrate")]
    pub mp3_bitrate: String,

    /// Kill the engine after this many seconds (0 = no limit).
    #[serde(default)]
    pub timeout_secs: u64,

    /// Inspect every stem before rendering.
    #[serde(default)]
    pub preflight_inspect: bool,
}

fn default_bit_depth() -> u16 {
    16
}

fn default_mp3_bitrate() -> String {
    DEFAULT_MP3_BITRATE.to_string()
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            default_format: ContainerFormat::default(),
            default_bit_depth: default_bit_depth(),
            default_sample_rate: None,
            mp3_bitrate: default_mp3_bitrate(),
            timeout_secs: 0,
            preflight_inspect: false,
        }
    }
}

impl RenderDefaults {
    /// Engine timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Defaults as fallback preferences for settings derivation.
    pub fn as_prefs(&self) -> RenderPrefs {
        RenderPrefs {
            sample_rate_hz: self.default_sample_rate,
            bit_depth: Some(self.default_bit_depth),
            container_format: Some(self.default_format),
        }
    }
}

/// `[paths]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Folder for rendered mixes when a job gives a relative output path.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "mixes".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

impl PathSettings {
    /// Resolve a job output path against the output folder.
    pub fn resolve_output(&self, output_path: &std::path::Path) -> PathBuf {
        if output_path.is_absolute() {
            output_path.to_path_buf()
        } else {
            PathBuf::from(&self.output_folder).join(output_path)
        }
    }
}

/// `[logging]`: per-job log files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Keep engine output out of the job log unless a render fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of engine output lines kept for failure reports.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Percent between progress lines in compact mode.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log the engine command one option per line.
    #[serde(default)]
    pub show_command_pretty: bool,

    /// Write a log file per job into `paths.logs_folder`.
    #[serde(default = "default_true")]
    pub write_job_logs: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            show_command_pretty: false,
            write_job_logs: true,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            compact: self.compact,
            progress_step: self.progress_step,
            tail_lines: self.error_tail as usize,
            ..LogConfig::default()
        }
    }
}

/// A table that [`ConfigManager::update_section`](super::ConfigManager::update_section) can rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Tools,
    Render,
    Paths,
    Logging,
}

impl ConfigSection {
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "tools",
            ConfigSection::Render => "render",
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
        }
    }

    /// All sections, in file order.
    pub fn all() -> [ConfigSection; 4] {
        [
            ConfigSection::Tools,
            ConfigSection::Render,
            ConfigSection::Paths,
            ConfigSection::Logging,
        ]
    }
}
