//! Core enums used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Wav,
    Mp3,
    Flac,
    Aiff,
    Ogg,
}

impl ContainerFormat {
    /// File extension the engine uses to pick the muxer.
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Wav => "wav",
            ContainerFormat::Mp3 => "mp3",
            ContainerFormat::Flac => "flac",
            ContainerFormat::Aiff => "aiff",
            ContainerFormat::Ogg => "ogg",
        }
    }

    /// Whether the format stores a lossy encoding (no meaningful bit depth).
    pub fn is_lossy(&self) -> bool {
        matches!(self, ContainerFormat::Mp3 | ContainerFormat::Ogg)
    }

    /// Parse a format name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wav" => Some(ContainerFormat::Wav),
            "mp3" => Some(ContainerFormat::Mp3),
            "flac" => Some(ContainerFormat::Flac),
            "aiff" | "aif" => Some(ContainerFormat::Aiff),
            "ogg" => Some(ContainerFormat::Ogg),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Classified reason a job did not produce its output file.
///
/// Every error type in the crate maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// External binary could not be started.
    Launch,
    /// Probe subprocess exited non-zero.
    Probe,
    /// Probe output was malformed or had no audio stream.
    MetadataParse,
    /// Job had no stems.
    EmptyStemList,
    /// An effect kind the render graph does not implement.
    UnsupportedEffect,
    /// Render settings the engine cannot realize.
    InvalidSettings,
    /// Out-of-range stem parameter (gain, pan).
    InvalidParameter,
    /// Render subprocess exited non-zero.
    Engine,
    /// Engine reported success but the output is missing or empty.
    Integrity,
    /// Caller cancelled the render.
    Cancelled,
    /// Render exceeded its time limit.
    TimedOut,
    /// Another job is already writing the same output path.
    OutputBusy,
    /// Filesystem error owned by the core (directories, staging files).
    Io,
}

impl FailureKind {
    /// Whether the failure can only be fixed by changing the job itself.
    pub fn is_caller_fixable(&self) -> bool {
        matches!(
            self,
            FailureKind::EmptyStemList
                | FailureKind::UnsupportedEffect
                | FailureKind::InvalidSettings
                | FailureKind::InvalidParameter
        )
    }

    /// Stable label used in status messages.
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Launch => "LaunchFailure",
            FailureKind::Probe => "ProbeFailure",
            FailureKind::MetadataParse => "MetadataParseFailure",
            FailureKind::EmptyStemList => "EmptyStemListError",
            FailureKind::UnsupportedEffect => "UnsupportedEffectError",
            FailureKind::InvalidSettings => "InvalidSettingsError",
            FailureKind::InvalidParameter => "InvalidParameterError",
            FailureKind::Engine => "EngineFailure",
            FailureKind::Integrity => "IntegrityFailure",
            FailureKind::Cancelled => "Cancelled",
            FailureKind::TimedOut => "TimedOut",
            FailureKind::OutputBusy => "OutputBusy",
            FailureKind::Io => "IoFailure",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Status vocabulary of the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Output file written.
    Completed,
    /// Job failed with error.
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_roundtrip() {
        for format in [
            ContainerFormat::Wav,
            ContainerFormat::Mp3,
            ContainerFormat::Flac,
            ContainerFormat::Aiff,
            ContainerFormat::Ogg,
        ] {
            assert_eq!(ContainerFormat::from_name(format.extension()), Some(format));
        }
        assert_eq!(ContainerFormat::from_name("WAV"), Some(ContainerFormat::Wav));
        assert_eq!(ContainerFormat::from_name("m4a"), None);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(serde_json::to_string(&JobStatus::Failed).unwrap(), "\"failed\"");
    }

    #[test]
    fn validation_kinds_are_caller_fixable() {
        assert!(FailureKind::EmptyStemList.is_caller_fixable());
        assert!(FailureKind::UnsupportedEffect.is_caller_fixable());
        assert!(!FailureKind::Engine.is_caller_fixable());
        assert!(!FailureKind::Launch.is_caller_fixable());
    }
}
