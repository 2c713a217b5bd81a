//! Probed audio file metadata.

use serde::{Deserialize, Serialize};

/// Container/header information for one audio file.
///
/// Produced by the inspector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMetadata {
    /// Duration in seconds (0.0 when the container does not say).
    pub duration_seconds: f64,
    /// Sample rate of the first audio stream.
    pub sample_rate_hz: u32,
    /// Bits per sample (16 when the codec does not report one).
    pub bit_depth: u16,
    /// Channel count of the first audio stream.
    pub channels: u16,
    /// Container format name as reported by the probe (e.g. "wav", "mov,mp4,m4a").
    pub container_format: String,
    /// Codec name of the first audio stream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    /// Size of the file on disk.
    pub file_size_bytes: u64,
}

