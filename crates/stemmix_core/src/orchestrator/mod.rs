//! Pipeline orchestrator for mix jobs.
//!
//! Each job runs as a short sequence of steps that validate, execute and
//! record their results in a [`JobState`].
//!
//! # Architecture
//!
//! ```text
//! MixOrchestrator
//!     └── Pipeline
//!         ├── Step: Validate
//!         ├── Step: Inspect     (preflight only)
//!         ├── Step: BuildGraph
//!         └── Step: Render
//! ```
//!
//! # Example
//!
//! ```no_run
//! use stemmix_core::config::Settings;
//! use stemmix_core::models::{RenderJob, RenderSettings, StemInput};
//! use stemmix_core::orchestrator::MixOrchestrator;
//!
//! # async fn run() {
//! let orchestrator = MixOrchestrator::from_settings(&Settings::default());
//! let job = RenderJob::new(
//!     vec![StemInput::new("drums.wav").with_gain(0.8), StemInput::new("bass.wav")],
//!     RenderSettings::default(),
//!     "mixes/final.wav",
//! );
//! let outcome = orchestrator.render_mix(&job).await;
//! println!("{:?}", outcome);
//! # }
//! ```

mod errors;
mod mix;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use mix::MixOrchestrator;
pub use pipeline::{Pipeline, PipelineReport};
pub use step::PipelineStep;
pub use steps::{BuildGraphStep, InspectStep, RenderStep, ValidateStep};
pub use types::{Context, JobState, ProgressCallback, RenderStepOutput, StepOutcome};
