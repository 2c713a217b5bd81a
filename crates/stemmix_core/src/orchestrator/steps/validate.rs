//! Validate step - rejects jobs that can never render.

use async_trait::async_trait;

use crate::graph::GraphError;
use crate::models::RenderJob;
use crate::orchestrator::errors::StepResult;
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

/// Checks the job before anything is spawned.
///
/// An empty stem list is reported first, then unrealizable settings.
pub struct ValidateStep;

impl ValidateStep {
    /// Checks that need nothing but the job itself.
    pub fn check(job: &RenderJob) -> StepResult<()> {
        if job.stems.is_empty() {
            return Err(GraphError::EmptyStemList.into());
        }
        job.settings.validate()?;
        Ok(())
    }
}

#[async_trait]
impl PipelineStep for ValidateStep {
    fn name(&self) -> &str {
        "Validate"
    }

    fn description(&self) -> &str {
        "Check stems and render settings"
    }

    fn validate_input(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
        let job = &ctx.job;
        Self::check(job)?;

        ctx.logger.info(&format!(
            "{} stem(s) -> {} ({} Hz, {}-bit)",
            job.stems.len(),
            job.output_path.display(),
            job.settings.sample_rate_hz,
            job.settings.bit_depth
        ));

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }
}
