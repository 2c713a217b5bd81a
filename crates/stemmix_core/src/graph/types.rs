//! Filter graph types and errors.

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::FailureKind;

/// Errors detected while compiling stems into a graph.
///
/// All of these are caller-fixable and raised before any subprocess runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Job has no stems to render")]
    EmptyStemList,

    #[error("Stem {stem}: effect '{kind}' is not supported by the render graph")]
    UnsupportedEffect { stem: usize, kind: String },

    #[error("Stem {stem}: {message}")]
    InvalidParameter { stem: usize, message: String },
}

impl GraphError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GraphError::EmptyStemList => FailureKind::EmptyStemList,
            GraphError::UnsupportedEffect { .. } => FailureKind::UnsupportedEffect,
            GraphError::InvalidParameter { .. } => FailureKind::InvalidParameter,
        }
    }
}

/// Result type for graph building.
pub type GraphResult<T> = Result<T, GraphError>;

/// Compiled `-filter_complex` description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGraph {
    text: String,
    output_label: String,
    input_count: usize,
}

impl FilterGraph {
    pub(crate) fn new(text: String, output_label: impl Into<String>, input_count: usize) -> Self {
        Self {
            text,
            output_label: output_label.into(),
            input_count,
        }
    }

    /// Graph text, passed verbatim to the engine.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Label of the single designated output (without brackets).
    pub fn output_label(&self) -> &str {
        &self.output_label
    }

    /// Output label in `-map` form, e.g. `[out]`.
    pub fn map_target(&self) -> String {
        format!("[{}]", self.output_label)
    }

    /// Number of engine inputs the graph references.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Whether the graph sums several stems.
    pub fn has_mix_node(&self) -> bool {
        self.text.contains("amix=")
    }

    /// SHA-256 of the graph text (hex), stable across runs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
