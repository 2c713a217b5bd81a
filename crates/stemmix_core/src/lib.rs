//! stemmix core - multi-stem audio render pipeline.
//!
//! Compiles per-stem gain/pan/effect settings into a filter graph, runs an
//! external render engine over it and classifies the result. Contains no
//! CLI dependencies so it can be embedded in any job runner.
//!
//! Entry points:
//! - [`inspect::AudioInspector::inspect`] for stem metadata
//! - [`orchestrator::MixOrchestrator::render_mix`] for a full job
//! - [`report::JobResultReporter::report`] for status updates

pub mod config;
pub mod graph;
pub mod inspect;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod report;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
