//! Log levels, job log configuration and line markers.

use std::collections::VecDeque;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity of a job log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// How a job log is written.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Keep engine output out of the log (tail only) and thin out progress.
    pub compact: bool,
    /// Progress granularity in compact mode, in percent.
    pub progress_step: u32,
    /// Engine stderr lines kept for the failure dump. 0 disables the tail.
    pub tail_lines: usize,
    /// Prefix each line with the local time.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: 20,
            tail_lines: 20,
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Everything, including engine output as it arrives.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            progress_step: 10,
            tail_lines: 50,
            timestamps: true,
        }
    }
}

/// Receives each formatted job log line.
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Decoration applied to structural log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMarker {
    /// `$ ffmpeg ...`
    Command,
    /// `=== Render ===`, one per pipeline step
    Step,
    /// `--- Executing render engine ---`
    Section,
    /// `[DONE] ...`
    Done,
    /// `[WARNING] ...`
    Warning,
    /// `[ERROR] ...`
    Error,
}

impl LineMarker {
    pub fn apply(self, text: &str) -> String {
        match self {
            LineMarker::Command => format!("$ {}", text),
            LineMarker::Step => format!("=== {} ===", text),
            LineMarker::Section => format!("--- {} ---", text),
            LineMarker::Done => format!("[DONE] {}", text),
            LineMarker::Warning => format!("[WARNING] {}", text),
            LineMarker::Error => format!("[ERROR] {}", text),
        }
    }
}

/// Last `capacity` lines of engine output.
#[derive(Debug)]
pub(crate) struct TailBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl TailBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, line: &str) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    pub(crate) fn lines(&self) -> impl Iterator<Item = &String> {
        self.lines.iter()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Drops progress updates that stay inside the current step bucket.
#[derive(Debug)]
pub(crate) struct ProgressGate {
    step: u32,
    last_bucket: Option<u32>,
}

impl ProgressGate {
    pub(crate) fn new(step: u32) -> Self {
        Self {
            step: step.max(1),
            last_bucket: None,
        }
    }

    /// Whether `percent` starts a new bucket. 100 always passes.
    pub(crate) fn admit(&mut self, percent: u32) -> bool {
        let bucket = percent / self.step;
        let fresh = self.last_bucket.map_or(true, |last| bucket > last);
        if fresh || percent >= 100 {
            self.last_bucket = Some(bucket);
            true
        } else {
            false
        }
    }
}
