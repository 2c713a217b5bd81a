//! Build graph step - compiles stems into the engine's filter graph.

use async_trait::async_trait;

use crate::graph::FilterGraphBuilder;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};

pub struct BuildGraphStep;

#[async_trait]
impl PipelineStep for BuildGraphStep {
    fn name(&self) -> &str {
        "BuildGraph"
    }

    fn description(&self) -> &str {
        "Compile per-stem chains and mix node"
    }

    fn validate_input(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let graph = FilterGraphBuilder::new(&ctx.job.stems).build()?;

        ctx.logger.debug(&format!("Filter graph: {}", graph));
        ctx.logger
            .debug(&format!("Graph fingerprint: {}", graph.fingerprint()));

        state.graph = Some(graph);
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_graph() {
            return Err(StepError::invalid_output("filter graph not recorded"));
        }
        Ok(())
    }
}
