//! Parsing of the probe's JSON document.

use serde_json::Value;

use crate::models::AudioMetadata;

use super::types::{InspectError, InspectResult};

/// Bit depth assumed when the codec does not report one (most lossy codecs).
const DEFAULT_BIT_DEPTH: u16 = 16;

/// Parse probe stdout into metadata.
///
/// Picks the first stream whose `codec_type` is `audio`; video, subtitle and
/// data streams are ignored.
pub fn parse_probe_output(stdout: &[u8], file_size_bytes: u64) -> InspectResult<AudioMetadata> {
    let json: Value = serde_json::from_slice(stdout)
        .map_err(|e| InspectError::parse(format!("output is not valid JSON: {}", e)))?;

    if !json.is_object() {
        return Err(InspectError::parse("output is not a JSON object"));
    }

    let stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.get("codec_type").and_then(|t| t.as_str()) == Some("audio"))
        })
        .ok_or_else(|| InspectError::parse("no audio stream found"))?;

    let format = json.get("format");

    let sample_rate_hz = stream
        .get("sample_rate")
        .and_then(number)
        .filter(|rate| *rate > 0.0)
        .map(|rate| rate as u32)
        .ok_or_else(|| InspectError::parse("audio stream has no sample rate"))?;

    let channels = stream
        .get("channels")
        .and_then(number)
        .filter(|c| *c >= 1.0)
        .map(|c| c as u16)
        .ok_or_else(|| InspectError::parse("audio stream has no channels"))?;

    // ffprobe reports 0 for codecs without a fixed sample size.
    let bit_depth = stream
        .get("bits_per_sample")
        .and_then(number)
        .filter(|b| *b > 0.0)
        .or_else(|| {
            stream
                .get("bits_per_raw_sample")
                .and_then(number)
                .filter(|b| *b > 0.0)
        })
        .map(|b| b as u16)
        .unwrap_or(DEFAULT_BIT_DEPTH);

    let duration_seconds = format
        .and_then(|f| f.get("duration"))
        .and_then(number)
        .or_else(|| stream.get("duration").and_then(number))
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    let container_format = format
        .and_then(|f| f.get("format_name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown")
        .to_string();

    let codec = stream
        .get("codec_name")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string());

    Ok(AudioMetadata {
        duration_seconds,
        sample_rate_hz,
        bit_depth,
        channels,
        container_format,
        codec,
        file_size_bytes,
    })
}

/// Whether stdout holds a JSON document at all.
///
/// The probe still prints its (empty) document when the input cannot be
/// demuxed, which separates "not audio" from "probe broke".
pub(crate) fn is_json_document(stdout: &[u8]) -> bool {
    serde_json::from_slice::<Value>(stdout)
        .map(|v| v.is_object())
        .unwrap_or(false)
}

/// Read a field the probe may emit either as a number or as a numeric string.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
