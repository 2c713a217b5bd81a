//! Error types for inspection.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::FailureKind;

/// Errors from probing an audio file.
#[derive(Error, Debug)]
pub enum InspectError {
    /// Input file does not exist or cannot be stat'ed.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Probe binary could not be started.
    #[error("Failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// Probe exited non-zero without producing a document.
    /// `exit_code` is -1 when the probe was killed by a signal.
    #[error("Probe failed with exit code {exit_code}: {}", String::from_utf8_lossy(.stderr))]
    ProbeFailed { exit_code: i32, stderr: Vec<u8> },

    /// Output was not well-formed, or described no audio stream.
    #[error("Failed to parse probe output: {0}")]
    MetadataParse(String),
}

impl InspectError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InspectError::FileNotFound(_) | InspectError::ProbeFailed { .. } => FailureKind::Probe,
            InspectError::Launch { .. } => FailureKind::Launch,
            InspectError::MetadataParse(_) => FailureKind::MetadataParse,
        }
    }

    /// Probe stderr is appended byte for byte.
    pub fn diagnostic_bytes(&self) -> Vec<u8> {
        match self {
            InspectError::ProbeFailed { exit_code, stderr } => {
                let mut bytes = format!("Probe failed with exit code {}: ", exit_code).into_bytes();
                bytes.extend_from_slice(stderr);
                bytes
            }
            other => other.to_string().into_bytes(),
        }
    }

    pub(crate) fn parse(message: impl Into<String>) -> Self {
        InspectError::MetadataParse(message.into())
    }
}

/// Result type for inspection.
pub type InspectResult<T> = Result<T, InspectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_stderr_survives_invalid_utf8() {
        let err = InspectError::ProbeFailed {
            exit_code: 1,
            stderr: b"\xff\xfe.wav: Invalid data\n".to_vec(),
        };
        assert!(err.diagnostic_bytes().ends_with(b"\xff\xfe.wav: Invalid data\n"));
        assert!(err.to_string().contains("Invalid data"));
        assert_eq!(err.kind(), FailureKind::Probe);
    }
}
