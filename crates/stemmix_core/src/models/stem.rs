//! Stem inputs and their effect chains.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One audio stem contributed to a mix.
///
/// Immutable for the duration of a render; ownership of the record lives
/// with the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemInput {
    /// Path to the decodable audio file.
    pub file_path: PathBuf,
    /// Linear gain multiplier (1.0 = unity).
    #[serde(default = "default_gain")]
    pub gain_linear: f64,
    /// Stereo position in [-1, 1] (0.0 = center).
    #[serde(default)]
    pub pan: f64,
    /// Effects applied after gain and pan, in order.
    #[serde(default)]
    pub effects: Vec<EffectSpec>,
}

fn default_gain() -> f64 {
    1.0
}

impl StemInput {
    /// Create a stem at unity gain, centered, with no effects.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            gain_linear: default_gain(),
            pan: 0.0,
            effects: Vec::new(),
        }
    }

    /// Set the linear gain.
    pub fn with_gain(mut self, gain_linear: f64) -> Self {
        self.gain_linear = gain_linear;
        self
    }

    /// Set the pan position.
    pub fn with_pan(mut self, pan: f64) -> Self {
        self.pan = pan;
        self
    }

    /// Append an effect to the chain.
    pub fn with_effect(mut self, effect: EffectSpec) -> Self {
        self.effects.push(effect);
        self
    }
}

/// A per-stem effect, keyed by kind with typed parameters.
///
/// Serialized as a flat object: `{"kind": "compressor", "ratio": 4.0, ...}`.
/// Kinds this release does not know are kept as [`EffectSpec::Unknown`] so
/// the graph builder can reject them by name instead of dropping them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawEffect", into = "RawEffect")]
pub enum EffectSpec {
    /// Extra gain in decibels.
    Gain { db: f64 },
    /// Extra pan stage, same law as the stem pan.
    Pan { position: f64 },
    /// Single peaking EQ band.
    Eq {
        frequency_hz: f64,
        gain_db: f64,
        q: f64,
    },
    /// Downward compressor.
    Compressor {
        threshold_db: f64,
        ratio: f64,
        attack_ms: f64,
        release_ms: f64,
    },
    /// Algorithmic reverb send.
    Reverb { room_size: f64, wet: f64 },
    /// Feedback delay.
    Delay {
        time_ms: f64,
        feedback: f64,
        mix: f64,
    },
    /// Any other kind, preserved verbatim.
    Unknown {
        kind: String,
        parameters: BTreeMap<String, f64>,
    },
}

impl EffectSpec {
    /// The kind name as it appears in job descriptions.
    pub fn kind(&self) -> &str {
        match self {
            EffectSpec::Gain { .. } => "gain",
            EffectSpec::Pan { .. } => "pan",
            EffectSpec::Eq { .. } => "eq",
            EffectSpec::Compressor { .. } => "compressor",
            EffectSpec::Reverb { .. } => "reverb",
            EffectSpec::Delay { .. } => "delay",
            EffectSpec::Unknown { kind, .. } => kind,
        }
    }

    /// Create an unknown effect with no parameters.
    pub fn unknown(kind: impl Into<String>) -> Self {
        EffectSpec::Unknown {
            kind: kind.into(),
            parameters: BTreeMap::new(),
        }
    }
}

/// Wire shape of an effect: kind plus a bag of numeric settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEffect {
    kind: String,
    #[serde(flatten)]
    parameters: BTreeMap<String, f64>,
}

impl RawEffect {
    fn get(&self, name: &str, default: f64) -> f64 {
        self.parameters.get(name).copied().unwrap_or(default)
    }
}

impl From<RawEffect> for EffectSpec {
    fn from(raw: RawEffect) -> Self {
        match raw.kind.as_str() {
            "gain" | "volume" => EffectSpec::Gain {
                db: raw.get("db", 0.0),
            },
            "pan" => EffectSpec::Pan {
                position: raw.get("position", 0.0),
            },
            "eq" => EffectSpec::Eq {
                frequency_hz: raw.get("frequency_hz", 1000.0),
                gain_db: raw.get("gain_db", 0.0),
                q: raw.get("q", 0.707),
            },
            "compressor" => EffectSpec::Compressor {
                threshold_db: raw.get("threshold_db", -18.0),
                ratio: raw.get("ratio", 4.0),
                attack_ms: raw.get("attack_ms", 10.0),
                release_ms: raw.get("release_ms", 100.0),
            },
            "reverb" => EffectSpec::Reverb {
                room_size: raw.get("room_size", 0.5),
                wet: raw.get("wet", 0.3),
            },
            "delay" => EffectSpec::Delay {
                time_ms: raw.get("time_ms", 250.0),
                feedback: raw.get("feedback", 0.3),
                mix: raw.get("mix", 0.25),
            },
            _ => EffectSpec::Unknown {
                kind: raw.kind,
                parameters: raw.parameters,
            },
        }
    }
}

impl From<EffectSpec> for RawEffect {
    fn from(effect: EffectSpec) -> Self {
        let kind = effect.kind().to_string();
        let parameters: BTreeMap<String, f64> = match effect {
            EffectSpec::Gain { db } => [("db", db)].into_iter().map(own).collect(),
            EffectSpec::Pan { position } => [("position", position)].into_iter().map(own).collect(),
            EffectSpec::Eq {
                frequency_hz,
                gain_db,
                q,
            } => [("frequency_hz", frequency_hz), ("gain_db", gain_db), ("q", q)]
                .into_iter()
                .map(own)
                .collect(),
            EffectSpec::Compressor {
                threshold_db,
                ratio,
                attack_ms,
                release_ms,
            } => [
                ("threshold_db", threshold_db),
                ("ratio", ratio),
                ("attack_ms", attack_ms),
                ("release_ms", release_ms),
            ]
            .into_iter()
            .map(own)
            .collect(),
            EffectSpec::Reverb { room_size, wet } => [("room_size", room_size), ("wet", wet)]
                .into_iter()
                .map(own)
                .collect(),
            EffectSpec::Delay {
                time_ms,
                feedback,
                mix,
            } => [("time_ms", time_ms), ("feedback", feedback), ("mix", mix)]
                .into_iter()
                .map(own)
                .collect(),
            EffectSpec::Unknown { parameters, .. } => parameters,
        };
        RawEffect { kind, parameters }
    }
}

fn own((name, value): (&str, f64)) -> (String, f64) {
    (name.to_string(), value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typed_effect() {
        let effect: EffectSpec =
            serde_json::from_str(r#"{"kind": "compressor", "ratio": 8.0}"#).unwrap();
        assert_eq!(
            effect,
            EffectSpec::Compressor {
                threshold_db: -18.0,
                ratio: 8.0,
                attack_ms: 10.0,
                release_ms: 100.0,
            }
        );
    }

    #[test]
    fn keeps_unknown_kind_name() {
        let effect: EffectSpec =
            serde_json::from_str(r#"{"kind": "sidechain", "amount": 0.5}"#).unwrap();
        assert_eq!(effect.kind(), "sidechain");
        match effect {
            EffectSpec::Unknown { parameters, .. } => {
                assert_eq!(parameters.get("amount"), Some(&0.5));
            }
            other => panic!("expected unknown effect, got {:?}", other),
        }
    }

    #[test]
    fn stem_defaults_apply() {
        let stem: StemInput = serde_json::from_str(r#"{"file_path": "/stems/drums.wav"}"#).unwrap();
        assert_eq!(stem.gain_linear, 1.0);
        assert_eq!(stem.pan, 0.0);
        assert!(stem.effects.is_empty());
    }

    #[test]
    fn effect_serializes_flat() {
        let json = serde_json::to_value(EffectSpec::Gain { db: -6.0 }).unwrap();
        assert_eq!(json["kind"], "gain");
        assert_eq!(json["db"], -6.0);
    }
}
