//! Job and step errors.
//!
//! A [`PipelineError`] names the job and step; the wrapped component error
//! decides the [`FailureKind`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::graph::GraphError;
use crate::inspect::InspectError;
use crate::models::{FailureKind, RenderOutcome, SettingsError};
use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{job_name}: {step_name} failed: {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    #[error("{job_name}: cancelled")]
    Cancelled { job_name: String },

    /// Another job is already writing this output path.
    #[error("Output {} is already being rendered by another job", .path.display())]
    OutputBusy { path: PathBuf },

    /// Output directory, staging file or log file could not be prepared.
    #[error("{job_name}: cannot {operation}: {source}")]
    SetupFailed {
        job_name: String,
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }

    pub fn setup_failed(
        job_name: impl Into<String>,
        operation: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::StepFailed { source, .. } => source.kind(),
            PipelineError::Cancelled { .. } => FailureKind::Cancelled,
            PipelineError::OutputBusy { .. } => FailureKind::OutputBusy,
            PipelineError::SetupFailed { .. } => FailureKind::Io,
        }
    }

    /// Step failures pass the component's diagnostic through untouched.
    pub fn diagnostic_bytes(&self) -> Vec<u8> {
        match self {
            PipelineError::StepFailed { source, .. } => source.diagnostic_bytes(),
            other => other.to_string().into_bytes(),
        }
    }

    pub fn diagnostic_text(&self) -> String {
        String::from_utf8_lossy(&self.diagnostic_bytes()).into_owned()
    }
}

impl From<PipelineError> for RenderOutcome {
    fn from(err: PipelineError) -> Self {
        RenderOutcome::failure(err.kind(), err.diagnostic_bytes())
    }
}

#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Invalid render settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// Step ran but left the job state incomplete.
    #[error("Step left no usable result: {0}")]
    InvalidOutput(String),
}

impl StepError {
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::Inspect(e) => e.kind(),
            StepError::Graph(e) => e.kind(),
            StepError::Render(e) => e.kind(),
            StepError::InvalidSettings(_) => FailureKind::InvalidSettings,
            StepError::InvalidOutput(_) => FailureKind::Integrity,
        }
    }

    pub fn diagnostic_bytes(&self) -> Vec<u8> {
        match self {
            StepError::Inspect(e) => e.diagnostic_bytes(),
            StepError::Render(e) => e.diagnostic_bytes(),
            other => other.to_string().into_bytes(),
        }
    }

    pub fn diagnostic_text(&self) -> String {
        String::from_utf8_lossy(&self.diagnostic_bytes()).into_owned()
    }
}

pub type StepResult<T> = Result<T, StepError>;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_survives_layers() {
        let step_err: StepError = GraphError::UnsupportedEffect {
            stem: 2,
            kind: "sidechain".to_string(),
        }
        .into();
        let err = PipelineError::step_failed("final_mix", "BuildGraph", step_err);

        assert_eq!(err.kind(), FailureKind::UnsupportedEffect);
        let msg = err.to_string();
        assert!(msg.contains("final_mix"));
        assert!(msg.contains("BuildGraph"));
        assert!(msg.contains("sidechain"));
    }

    #[test]
    fn engine_stderr_is_not_wrapped() {
        let stderr = b"st\xe9m.wav: No such file or directory\n".to_vec();
        let step_err: StepError = RenderError::Engine {
            exit_code: 1,
            diagnostic: stderr.clone(),
        }
        .into();
        let err = PipelineError::step_failed("mix", "Render", step_err);

        let outcome: RenderOutcome = err.into();
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Engine));
        assert_eq!(outcome.diagnostic_bytes(), Some(stderr.as_slice()));
    }

    #[test]
    fn setup_errors_are_io() {
        let err = PipelineError::setup_failed(
            "mix",
            "create output directory",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), FailureKind::Io);
        assert!(err.diagnostic_text().contains("create output directory"));
    }
}
