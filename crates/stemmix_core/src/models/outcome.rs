//! Render outcomes and the status updates derived from them.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::{FailureKind, JobStatus};

/// Result of one render job.
///
/// Created once per job and consumed by the reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Output file written and verified.
    Success { output_path: PathBuf },
    /// Job failed; `diagnostic` explains why.
    ///
    /// Engine and probe stderr are kept exactly as emitted, even when they
    /// are not valid UTF-8. JSON carries the lossy text form.
    Failure {
        kind: FailureKind,
        #[serde(rename = "diagnostic_text", with = "lossy_text")]
        diagnostic: Vec<u8>,
    },
}

impl RenderOutcome {
    pub fn success(output_path: impl Into<PathBuf>) -> Self {
        Self::Success {
            output_path: output_path.into(),
        }
    }

    pub fn failure(kind: FailureKind, diagnostic: impl Into<Vec<u8>>) -> Self {
        Self::Failure {
            kind,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Output path on success.
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            Self::Success { output_path } => Some(output_path),
            Self::Failure { .. } => None,
        }
    }

    /// Failure kind, if the job failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Raw diagnostic bytes, if the job failed.
    pub fn diagnostic_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { diagnostic, .. } => Some(diagnostic),
        }
    }

    /// Diagnostic as text; invalid UTF-8 is replaced.
    pub fn diagnostic_text(&self) -> Option<Cow<'_, str>> {
        self.diagnostic_bytes().map(String::from_utf8_lossy)
    }
}

mod lossy_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        String::deserialize(deserializer).map(String::into_bytes)
    }
}

/// Status fields written back by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusUpdate {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_raw_bytes() {
        let outcome = RenderOutcome::failure(FailureKind::Engine, b"bad \xff\xfe name\n".to_vec());
        assert_eq!(outcome.diagnostic_bytes(), Some(&b"bad \xff\xfe name\n"[..]));
        assert_eq!(
            outcome.diagnostic_text().as_deref(),
            Some("bad \u{fffd}\u{fffd} name\n")
        );
    }

    #[test]
    fn json_carries_text() {
        let outcome = RenderOutcome::failure(FailureKind::Probe, "exit 1");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["diagnostic_text"], "exit 1");

        let back: RenderOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
