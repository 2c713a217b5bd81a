//! Error and output types for rendering.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::{FailureKind, RenderOutcome, SettingsError};

/// Errors from a render invocation.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Settings the engine cannot realize; raised before spawning.
    #[error("Invalid render settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    /// Graph references a different number of inputs than stems supplied.
    #[error("Filter graph expects {expected} input(s) but {actual} stem(s) were supplied")]
    GraphMismatch { expected: usize, actual: usize },

    /// Engine binary could not be started.
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// Engine exited non-zero. `exit_code` is -1 when killed by a signal.
    #[error("Render engine failed with exit code {exit_code}: {}", String::from_utf8_lossy(.diagnostic))]
    Engine { exit_code: i32, diagnostic: Vec<u8> },

    /// Engine reported success but left no usable output.
    #[error("Render engine exited successfully but output is missing or empty: {}", .path.display())]
    Integrity { path: PathBuf },

    /// Render was cancelled by the caller.
    #[error("Render cancelled")]
    Cancelled { diagnostic: Vec<u8> },

    /// Render exceeded the configured timeout.
    #[error("Render timed out after {}s", .after.as_secs_f64())]
    TimedOut { after: Duration, diagnostic: Vec<u8> },

    /// I/O failure while supervising the subprocess.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl RenderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RenderError::InvalidSettings(_) => FailureKind::InvalidSettings,
            RenderError::GraphMismatch { .. } => FailureKind::InvalidParameter,
            RenderError::Launch { .. } => FailureKind::Launch,
            RenderError::Engine { .. } => FailureKind::Engine,
            RenderError::Integrity { .. } => FailureKind::Integrity,
            RenderError::Cancelled { .. } => FailureKind::Cancelled,
            RenderError::TimedOut { .. } => FailureKind::TimedOut,
            RenderError::Io { .. } => FailureKind::Io,
        }
    }

    /// Bytes explaining the failure.
    ///
    /// For engine failures this is the engine's stderr, byte for byte.
    pub fn diagnostic_bytes(&self) -> Vec<u8> {
        match self {
            RenderError::Engine { diagnostic, .. } => diagnostic.clone(),
            RenderError::Cancelled { diagnostic } | RenderError::TimedOut { diagnostic, .. }
                if !diagnostic.is_empty() =>
            {
                let mut bytes = format!("{}\n", self).into_bytes();
                bytes.extend_from_slice(diagnostic);
                bytes
            }
            other => other.to_string().into_bytes(),
        }
    }

    pub fn diagnostic_text(&self) -> String {
        String::from_utf8_lossy(&self.diagnostic_bytes()).into_owned()
    }

    pub(crate) fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        RenderError::Io {
            operation: operation.into(),
            source,
        }
    }
}

impl From<RenderError> for RenderOutcome {
    fn from(err: RenderError) -> Self {
        RenderOutcome::failure(err.kind(), err.diagnostic_bytes())
    }
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Details of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Verified output file.
    pub output_path: PathBuf,
    /// Engine exit code (always 0).
    pub exit_code: i32,
    /// Command line that was run, for logs.
    pub command: String,
    /// Engine stderr (warnings, stats).
    pub diagnostics: String,
    /// Wall-clock time of the subprocess.
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_diagnostic_is_verbatim() {
        let err = RenderError::Engine {
            exit_code: 1,
            diagnostic: b"line one\nline two \xff\n".to_vec(),
        };
        assert_eq!(err.diagnostic_bytes(), b"line one\nline two \xff\n");
        assert_eq!(err.kind(), FailureKind::Engine);

        let outcome: RenderOutcome = err.into();
        assert_eq!(outcome.diagnostic_bytes(), Some(&b"line one\nline two \xff\n"[..]));
    }

    #[test]
    fn settings_errors_convert() {
        let err: RenderError = SettingsError::BitDepth(8).into();
        assert_eq!(err.kind(), FailureKind::InvalidSettings);
        assert!(err.to_string().contains("bit depth 8"));
    }

    #[test]
    fn cancelled_keeps_partial_stderr() {
        let err = RenderError::Cancelled {
            diagnostic: b"size=  1024kB".to_vec(),
        };
        let text = err.diagnostic_text();
        assert!(text.starts_with("Render cancelled"));
        assert!(text.contains("size=  1024kB"));
    }
}
