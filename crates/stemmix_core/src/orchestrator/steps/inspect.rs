//! Inspect step - optional preflight probe of every stem.

use std::sync::Arc;

use async_trait::async_trait;

use crate::inspect::AudioInspector;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Probes each stem in order and records its metadata.
///
/// Stops at the first stem that cannot be inspected.
pub struct InspectStep {
    inspector: Arc<AudioInspector>,
}

impl InspectStep {
    pub fn new(inspector: Arc<AudioInspector>) -> Self {
        Self { inspector }
    }
}

#[async_trait]
impl PipelineStep for InspectStep {
    fn name(&self) -> &str {
        "Inspect"
    }

    fn description(&self) -> &str {
        "Probe stem files"
    }

    fn validate_input(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        for (index, stem) in ctx.job.stems.iter().enumerate() {
            let meta = self.inspector.inspect(&stem.file_path).await?;

            ctx.logger.info(&format!(
                "Stem {}: {} ({} Hz, {}-bit, {} ch, {:.2}s)",
                index,
                stem.file_path.display(),
                meta.sample_rate_hz,
                meta.bit_depth,
                meta.channels,
                meta.duration_seconds
            ));

            if meta.sample_rate_hz != ctx.job.settings.sample_rate_hz {
                ctx.logger.debug(&format!(
                    "Stem {} will be resampled from {} Hz",
                    index, meta.sample_rate_hz
                ));
            }

            state.stem_metadata.push(meta);
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.stem_metadata.len() != ctx.job.stems.len() {
            return Err(StepError::invalid_output(format!(
                "inspected {} of {} stems",
                state.stem_metadata.len(),
                ctx.job.stems.len()
            )));
        }
        Ok(())
    }
}
