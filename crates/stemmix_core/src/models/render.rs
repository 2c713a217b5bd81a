//! Render settings and jobs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::ContainerFormat;
use super::metadata::AudioMetadata;
use super::stem::StemInput;

/// Output sample rates the render engine is asked for.
pub const ALLOWED_SAMPLE_RATES: [u32; 5] = [44100, 48000, 88200, 96000, 192000];

/// Output bit depths.
pub const ALLOWED_BIT_DEPTHS: [u16; 3] = [16, 24, 32];

/// Highest sample rate an MPEG-1 Layer III stream can carry.
const MP3_MAX_SAMPLE_RATE: u32 = 48000;

const FALLBACK_SAMPLE_RATE: u32 = 48000;
const FALLBACK_BIT_DEPTH: u16 = 16;

/// Settings that cannot be realized by the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("unsupported sample rate {0} Hz (allowed: 44100, 48000, 88200, 96000, 192000)")]
    SampleRate(u32),

    #[error("unsupported bit depth {0} (allowed: 16, 24, 32)")]
    BitDepth(u16),

    #[error("{format} output cannot be written at {bit_depth}-bit")]
    BitDepthForFormat {
        format: ContainerFormat,
        bit_depth: u16,
    },

    #[error("{format} output cannot be written at {sample_rate} Hz")]
    SampleRateForFormat {
        format: ContainerFormat,
        sample_rate: u32,
    },
}

/// Target format of the rendered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub sample_rate_hz: u32,
    pub bit_depth: u16,
    pub container_format: ContainerFormat,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            bit_depth: FALLBACK_BIT_DEPTH,
            container_format: ContainerFormat::Wav,
        }
    }
}

impl RenderSettings {
    /// Create settings without validating them.
    pub fn new(sample_rate_hz: u32, bit_depth: u16, container_format: ContainerFormat) -> Self {
        Self {
            sample_rate_hz,
            bit_depth,
            container_format,
        }
    }

    /// Check that the engine can realize this combination.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !ALLOWED_SAMPLE_RATES.contains(&self.sample_rate_hz) {
            return Err(SettingsError::SampleRate(self.sample_rate_hz));
        }
        if !ALLOWED_BIT_DEPTHS.contains(&self.bit_depth) {
            return Err(SettingsError::BitDepth(self.bit_depth));
        }

        let format = self.container_format;
        let depth_ok = match format {
            ContainerFormat::Wav | ContainerFormat::Aiff => true,
            ContainerFormat::Flac => self.bit_depth <= 24,
            ContainerFormat::Mp3 | ContainerFormat::Ogg => self.bit_depth == 16,
        };
        if !depth_ok {
            return Err(SettingsError::BitDepthForFormat {
                format,
                bit_depth: self.bit_depth,
            });
        }

        if format == ContainerFormat::Mp3 && self.sample_rate_hz > MP3_MAX_SAMPLE_RATE {
            return Err(SettingsError::SampleRateForFormat {
                format,
                sample_rate: self.sample_rate_hz,
            });
        }

        Ok(())
    }

    /// Resolve settings from per-project preferences.
    ///
    /// Each field comes from `prefs`, then `fallback`, then (sample rate only)
    /// the probed input. An inherited input rate the format cannot carry is
    /// replaced by the nearest rate of the same family (44.1k or 48k).
    /// Explicit choices are kept as-is so `validate` can reject them.
    pub fn derive(
        prefs: &RenderPrefs,
        fallback: &RenderPrefs,
        probed: Option<&AudioMetadata>,
    ) -> Self {
        let container_format = prefs
            .container_format
            .or(fallback.container_format)
            .unwrap_or_default();

        let bit_depth = if container_format.is_lossy() {
            FALLBACK_BIT_DEPTH
        } else {
            prefs
                .bit_depth
                .or(fallback.bit_depth)
                .unwrap_or(FALLBACK_BIT_DEPTH)
        };

        let sample_rate_hz = match prefs.sample_rate_hz.or(fallback.sample_rate_hz) {
            Some(rate) => rate,
            None => probed
                .map(|m| inherit_sample_rate(m.sample_rate_hz, container_format))
                .unwrap_or(FALLBACK_SAMPLE_RATE),
        };

        Self {
            sample_rate_hz,
            bit_depth,
            container_format,
        }
    }
}

fn inherit_sample_rate(input_rate: u32, format: ContainerFormat) -> u32 {
    let family_base = if input_rate % 11025 == 0 { 44100 } else { 48000 };
    let usable = ALLOWED_SAMPLE_RATES.contains(&input_rate)
        && !(format == ContainerFormat::Mp3 && input_rate > MP3_MAX_SAMPLE_RATE);
    if usable {
        input_rate
    } else {
        family_base
    }
}

/// Optional per-project render preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPrefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate_hz: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_depth: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_format: Option<ContainerFormat>,
}

/// One request to render a set of stems into a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    /// Stems in mix order.
    pub stems: Vec<StemInput>,
    /// Target format.
    pub settings: RenderSettings,
    /// Destination file; its parent directory is created on demand.
    pub output_path: PathBuf,
}

impl RenderJob {
    pub fn new(stems: Vec<StemInput>, settings: RenderSettings, output_path: impl Into<PathBuf>) -> Self {
        Self {
            stems,
            settings,
            output_path: output_path.into(),
        }
    }

    /// Job name derived from the output file stem.
    pub fn name(&self) -> String {
        self.output_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "mix".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(rate: u32) -> AudioMetadata {
        AudioMetadata {
            duration_seconds: 1.0,
            sample_rate_hz: rate,
            bit_depth: 24,
            channels: 2,
            container_format: "wav".to_string(),
            codec: Some("pcm_s24le".to_string()),
            file_size_bytes: 1024,
        }
    }

    #[test]
    fn accepts_common_settings() {
        assert!(RenderSettings::new(44100, 16, ContainerFormat::Wav).validate().is_ok());
        assert!(RenderSettings::new(96000, 24, ContainerFormat::Flac).validate().is_ok());
        assert!(RenderSettings::new(48000, 32, ContainerFormat::Aiff).validate().is_ok());
        assert!(RenderSettings::new(44100, 16, ContainerFormat::Mp3).validate().is_ok());
    }

    #[test]
    fn rejects_unknown_rate_and_depth() {
        assert_eq!(
            RenderSettings::new(22050, 16, ContainerFormat::Wav).validate(),
            Err(SettingsError::SampleRate(22050))
        );
        assert_eq!(
            RenderSettings::new(44100, 8, ContainerFormat::Wav).validate(),
            Err(SettingsError::BitDepth(8))
        );
    }

    #[test]
    fn rejects_unrealizable_combinations() {
        assert!(matches!(
            RenderSettings::new(44100, 24, ContainerFormat::Mp3).validate(),
            Err(SettingsError::BitDepthForFormat { .. })
        ));
        assert!(matches!(
            RenderSettings::new(44100, 32, ContainerFormat::Flac).validate(),
            Err(SettingsError::BitDepthForFormat { .. })
        ));
        assert!(matches!(
            RenderSettings::new(96000, 16, ContainerFormat::Mp3).validate(),
            Err(SettingsError::SampleRateForFormat { .. })
        ));
    }

    #[test]
    fn derive_inherits_input_rate() {
        let settings = RenderSettings::derive(
            &RenderPrefs::default(),
            &RenderPrefs::default(),
            Some(&meta(96000)),
        );
        assert_eq!(settings.sample_rate_hz, 96000);
        assert_eq!(settings.bit_depth, 16);
        assert_eq!(settings.container_format, ContainerFormat::Wav);
    }

    #[test]
    fn derive_snaps_rate_to_family() {
        let prefs = RenderPrefs {
            container_format: Some(ContainerFormat::Mp3),
            ..Default::default()
        };
        let settings = RenderSettings::derive(&prefs, &RenderPrefs::default(), Some(&meta(88200)));
        assert_eq!(settings.sample_rate_hz, 44100);
        assert!(settings.validate().is_ok());

        let odd = RenderSettings::derive(&RenderPrefs::default(), &RenderPrefs::default(), Some(&meta(32000)));
        assert_eq!(odd.sample_rate_hz, 48000);
    }

    #[test]
    fn derive_prefers_explicit_values() {
        let prefs = RenderPrefs {
            sample_rate_hz: Some(44100),
            bit_depth: Some(24),
            container_format: Some(ContainerFormat::Flac),
        };
        let fallback = RenderPrefs {
            sample_rate_hz: Some(48000),
            bit_depth: Some(32),
            container_format: Some(ContainerFormat::Wav),
        };
        let settings = RenderSettings::derive(&prefs, &fallback, Some(&meta(96000)));
        assert_eq!(settings, RenderSettings::new(44100, 24, ContainerFormat::Flac));
    }

    #[test]
    fn derive_forces_16_bit_for_lossy() {
        let prefs = RenderPrefs {
            bit_depth: Some(24),
            container_format: Some(ContainerFormat::Ogg),
            ..Default::default()
        };
        let settings = RenderSettings::derive(&prefs, &RenderPrefs::default(), None);
        assert_eq!(settings.bit_depth, 16);
        assert_eq!(settings.sample_rate_hz, 48000);
    }

    #[test]
    fn job_name_from_output() {
        let job = RenderJob::new(vec![], RenderSettings::default(), "/mixes/final_mix.wav");
        assert_eq!(job.name(), "final_mix");
    }
}
