//! Per-job log file.
//!
//! One `JobLogger` lives for the duration of a render job. Every line goes
//! to the job's log file (unless detached), to the optional callback, and
//! into `tracing` with a `job` field. Engine stderr is kept in a bounded
//! tail that is dumped into the log when the render fails.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LineMarker, LogCallback, LogConfig, LogLevel, ProgressGate, TailBuffer};

pub struct JobLogger {
    job_name: String,
    log_path: Option<PathBuf>,
    file: Mutex<Option<BufWriter<File>>>,
    callback: Option<LogCallback>,
    config: LogConfig,
    tail: Mutex<TailBuffer>,
    progress: Mutex<ProgressGate>,
}

impl JobLogger {
    /// Log into `<log_dir>/<job_name>.log`, truncating a previous run's log.
    pub fn new(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let job_name = job_name.into();
        let file_stem = job_name.clone();
        Self::with_file_stem(job_name, log_dir, &file_stem, config, callback)
    }

    /// Log into `<log_dir>/<file_stem>.log`.
    pub fn with_file_stem(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        file_stem: &str,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let mut logger = Self::detached(job_name, config, callback);
        let path = log_dir.join(format!("{}.log", file_safe(file_stem)));
        logger.file = Mutex::new(Some(BufWriter::new(File::create(&path)?)));
        logger.log_path = Some(path);
        Ok(logger)
    }

    /// Logger without a file; lines still reach the callback and `tracing`.
    pub fn detached(
        job_name: impl Into<String>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            log_path: None,
            file: Mutex::new(None),
            callback,
            tail: Mutex::new(TailBuffer::new(config.tail_lines)),
            progress: Mutex::new(ProgressGate::new(config.progress_step)),
            config,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        let job = self.job_name.as_str();
        match level {
            LogLevel::Trace => tracing::trace!(job, "{}", message),
            LogLevel::Debug => tracing::debug!(job, "{}", message),
            LogLevel::Info => tracing::info!(job, "{}", message),
            LogLevel::Warn => tracing::warn!(job, "{}", message),
            LogLevel::Error => tracing::error!(job, "{}", message),
        }

        self.emit(message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &LineMarker::Warning.apply(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &LineMarker::Error.apply(message));
    }

    /// Start-of-step banner.
    pub fn step(&self, name: &str) {
        self.info(&LineMarker::Step.apply(name));
    }

    pub fn section(&self, name: &str) {
        self.info(&LineMarker::Section.apply(name));
    }

    pub fn command(&self, command_line: &str) {
        self.info(&LineMarker::Command.apply(command_line));
    }

    pub fn done(&self, message: &str) {
        self.info(&LineMarker::Done.apply(message));
    }

    /// Log overall progress. In compact mode only bucket changes are written.
    ///
    /// Returns whether a line was written.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact && !self.progress.lock().admit(percent) {
            return false;
        }
        self.info(&format!("Progress: {}%", percent));
        true
    }

    /// Record captured engine stderr.
    ///
    /// Lines always enter the tail; they are written out only when not compact.
    pub fn engine_output(&self, text: &str) {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.tail.lock().push(line);
            if !self.config.compact {
                self.emit(&format!("[engine] {}", line));
            }
        }
    }

    /// Write the tail under a `[header/tail]` banner.
    pub fn dump_tail(&self, header: &str) {
        let tail = self.tail.lock();
        if tail.is_empty() {
            return;
        }
        self.emit(&format!("[{}/tail]", header));
        for line in tail.lines() {
            self.emit(line);
        }
    }

    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().lines().cloned().collect()
    }

    pub fn clear_tail(&self) {
        self.tail.lock().clear();
    }

    /// Log a command with each option and its value on its own line.
    pub fn command_pretty(&self, program: &str, args: &[String]) {
        self.section("render command (pretty)");

        let mut lines = vec![program.to_string()];
        let mut rest = args.iter().peekable();
        while let Some(arg) = rest.next() {
            let takes_value = arg.starts_with('-')
                && rest.peek().is_some_and(|next| !next.starts_with('-'));
            match rest.next_if(|_| takes_value) {
                Some(value) => lines.push(format!("{} {}", arg, value)),
                None => lines.push(arg.clone()),
            }
        }
        self.info(&lines.join(" \\\n  "));
    }

    pub fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }

    /// Flush and close the file; later lines reach the callback only.
    pub fn close(&self) {
        self.flush();
        self.file.lock().take();
    }

    fn emit(&self, message: &str) {
        let line = if self.config.timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };

        if let Some(file) = self.file.lock().as_mut() {
            let _ = writeln!(file, "{}", line);
        }
        if let Some(callback) = &self.callback {
            callback(&line);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Job names come from output file stems; keep them usable as file names.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
