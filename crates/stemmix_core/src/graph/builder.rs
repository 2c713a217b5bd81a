//! Filter graph builder.
//!
//! Builds the `-filter_complex` text for a list of stems. Each stem becomes
//! one chain reading engine input `i`; chains are joined with `;`.
//!
//! # Chain layout
//!
//! - `volume=<gain>`: the stem's linear gain
//! - `aformat=channel_layouts=stereo`: mono is duplicated, multichannel downmixed,
//!   so the pan stage always sees two channels
//! - `pan=stereo|c0=<L>*c0|c1=<R>*c1`: linear pan law from [`pan_gains`]
//! - supported effects, in order

use std::fmt::Write;

use crate::models::{EffectSpec, StemInput};

use super::pan::pan_gains;
use super::types::{FilterGraph, GraphError, GraphResult};

/// Label of the graph's single output stream.
pub const OUTPUT_LABEL: &str = "out";

/// Builder for the render filter graph.
pub struct FilterGraphBuilder<'a> {
    stems: &'a [StemInput],
}

impl<'a> FilterGraphBuilder<'a> {
    /// Create a new graph builder.
    pub fn new(stems: &'a [StemInput]) -> Self {
        Self { stems }
    }

    /// Build the graph.
    ///
    /// Fails before producing any text if the stem list is empty, a parameter
    /// is out of range, or an effect kind is not implemented.
    pub fn build(&self) -> GraphResult<FilterGraph> {
        if self.stems.is_empty() {
            return Err(GraphError::EmptyStemList);
        }

        for (index, stem) in self.stems.iter().enumerate() {
            validate_stem(index, stem)?;
        }

        let single = self.stems.len() == 1;
        let mut chains = Vec::with_capacity(self.stems.len() + 1);

        for (index, stem) in self.stems.iter().enumerate() {
            let label = if single {
                OUTPUT_LABEL.to_string()
            } else {
                stem_label(index)
            };
            chains.push(self.stem_chain(index, stem, &label)?);
        }

        if !single {
            chains.push(self.mix_node());
        }

        let text = chains.join(";");
        tracing::debug!("Built filter graph for {} stem(s): {}", self.stems.len(), text);

        Ok(FilterGraph::new(text, OUTPUT_LABEL, self.stems.len()))
    }

    /// Processing chain for one stem, ending in `[label]`.
    fn stem_chain(&self, index: usize, stem: &StemInput, label: &str) -> GraphResult<String> {
        let mut chain = format!("[{}:a]volume={}", index, fmt_num(stem.gain_linear));
        chain.push_str(",aformat=channel_layouts=stereo");
        chain.push(',');
        chain.push_str(&pan_filter(stem.pan));

        for effect in &stem.effects {
            chain.push(',');
            chain.push_str(&effect_filter(index, effect)?);
        }

        let _ = write!(chain, "[{}]", label);
        Ok(chain)
    }

    /// Summing node over every stem label.
    ///
    /// `amix` averages its inputs; `duration=longest` zero-pads shorter stems.
    fn mix_node(&self) -> String {
        let mut node = String::new();
        for index in 0..self.stems.len() {
            let _ = write!(node, "[{}]", stem_label(index));
        }
        let _ = write!(
            node,
            "amix=inputs={}:duration=longest[{}]",
            self.stems.len(),
            OUTPUT_LABEL
        );
        node
    }
}

/// Build the filter graph for `stems`.
pub fn build_filter_graph(stems: &[StemInput]) -> GraphResult<FilterGraph> {
    FilterGraphBuilder::new(stems).build()
}

fn stem_label(index: usize) -> String {
    format!("s{}", index)
}

fn pan_filter(pan: f64) -> String {
    let (left, right) = pan_gains(pan);
    format!(
        "pan=stereo|c0={}*c0|c1={}*c1",
        fmt_num(left),
        fmt_num(right)
    )
}

fn effect_filter(stem: usize, effect: &EffectSpec) -> GraphResult<String> {
    match effect {
        EffectSpec::Gain { db } => Ok(format!("volume={}", fmt_num(db_to_linear(*db)))),
        EffectSpec::Pan { position } => Ok(pan_filter(*position)),
        other => Err(GraphError::UnsupportedEffect {
            stem,
            kind: other.kind().to_string(),
        }),
    }
}

fn validate_stem(index: usize, stem: &StemInput) -> GraphResult<()> {
    if !stem.gain_linear.is_finite() || stem.gain_linear < 0.0 {
        return Err(GraphError::InvalidParameter {
            stem: index,
            message: format!("gain must be a finite value >= 0, got {}", stem.gain_linear),
        });
    }
    validate_pan(index, stem.pan)?;

    for effect in &stem.effects {
        match effect {
            EffectSpec::Gain { db } if !db.is_finite() || !db_to_linear(*db).is_finite() => {
                return Err(GraphError::InvalidParameter {
                    stem: index,
                    message: format!("gain effect must be a finite level, got {} dB", db),
                });
            }
            EffectSpec::Pan { position } => validate_pan(index, *position)?,
            EffectSpec::Gain { .. } => {}
            other => {
                return Err(GraphError::UnsupportedEffect {
                    stem: index,
                    kind: other.kind().to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_pan(index: usize, pan: f64) -> GraphResult<()> {
    if !pan.is_finite() || !(-1.0..=1.0).contains(&pan) {
        return Err(GraphError::InvalidParameter {
            stem: index,
            message: format!("pan must be within [-1, 1], got {}", pan),
        });
    }
    Ok(())
}

fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Significant digits kept in graph coefficients.
const SIGNIFICANT_DIGITS: i32 = 9;

/// Format a coefficient to nine significant digits, plain decimal, no
/// trailing zeros. Small non-zero values stay non-zero.
fn fmt_num(value: f64) -> String {
    if value == 0.0 {
        // also folds -0.0
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let scale = 10f64.powi(SIGNIFICANT_DIGITS - 1 - magnitude);
    if !scale.is_finite() {
        return format!("{}", value);
    }
    format!("{}", (value * scale).round() / scale)
}
