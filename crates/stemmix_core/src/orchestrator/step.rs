//! The unit of work the pipeline runs.

use async_trait::async_trait;

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// One stage of a render job (validate, inspect, build graph, render).
///
/// For each step the runner calls `validate_input`, then `execute`, then
/// `validate_output` if execution succeeded. Any error ends the job.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Short name used in logs, progress reports and errors.
    fn name(&self) -> &str;

    fn validate_input(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Do the work and record the result in `state`.
    async fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Progress message; defaults to the name.
    fn description(&self) -> &str {
        self.name()
    }
}
