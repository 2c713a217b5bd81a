//! Data models for stemmix.
//!
//! This module contains the data structures that flow through the render pipeline:
//! - Enums for container formats, failure kinds, job status
//! - Stem inputs and their typed effect chains
//! - Render settings and jobs
//! - Probed audio metadata
//! - Render outcomes and the status updates derived from them

mod enums;
mod metadata;
mod outcome;
mod render;
mod stem;

// Re-export all public types
pub use enums::{ContainerFormat, FailureKind, JobStatus};
pub use metadata::AudioMetadata;
pub use outcome::{JobStatusUpdate, RenderOutcome};
pub use render::{
    RenderJob, RenderPrefs, RenderSettings, SettingsError, ALLOWED_BIT_DEPTHS,
    ALLOWED_SAMPLE_RATES,
};
pub use stem::{EffectSpec, StemInput};
