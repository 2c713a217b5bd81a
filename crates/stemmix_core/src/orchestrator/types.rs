//! Context and state shared by the render steps.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::graph::FilterGraph;
use crate::logging::JobLogger;
use crate::models::{AudioMetadata, RenderJob};
use crate::render::CancelHandle;

/// `(step, percent, message)`
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// What a step may read: the job, where to stage output, and how to log.
pub struct Context {
    /// The job being rendered.
    pub job: RenderJob,
    /// Job name (output file stem).
    pub job_name: String,
    /// Where the engine writes; renamed onto `job.output_path` on success.
    pub staging_path: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Cancels the pipeline and any running engine.
    pub cancel: CancelHandle,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        job: RenderJob,
        staging_path: PathBuf,
        logger: Arc<JobLogger>,
        cancel: CancelHandle,
    ) -> Self {
        let job_name = job.name();
        Self {
            job,
            job_name,
            staging_path,
            logger,
            cancel,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// No-op without a callback.
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(callback) = &self.progress_callback {
            callback(step_name, percent, message);
        }
    }
}

/// Filled in step by step; each field has one writer.
#[derive(Debug, Clone, Default)]
pub struct JobState {
    pub job_id: String,
    /// When the job started (RFC 3339).
    pub started_at: Option<String>,
    /// Per-stem metadata, in stem order (preflight only).
    pub stem_metadata: Vec<AudioMetadata>,
    /// Compiled filter graph.
    pub graph: Option<FilterGraph>,
    /// Render step results.
    pub render: Option<RenderStepOutput>,
}

impl JobState {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    pub fn has_metadata(&self) -> bool {
        !self.stem_metadata.is_empty()
    }
}

/// Output from the Render step.
#[derive(Debug, Clone)]
pub struct RenderStepOutput {
    /// Verified file written by the engine (the staging path).
    pub rendered_path: PathBuf,
    /// Command line that was run.
    pub command: String,
    /// Engine stderr.
    pub diagnostics: String,
    /// Time spent in the engine.
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    /// Step had nothing to do (reason).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_records_start() {
        let state = JobState::new("job-1");
        assert_eq!(state.job_id, "job-1");
        assert!(state.started_at.is_some());
        assert!(!state.has_graph());
        assert!(!state.has_metadata());
    }
}
