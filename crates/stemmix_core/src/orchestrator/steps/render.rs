//! Render step - runs the engine into the job's staging file.

use std::sync::Arc;

use async_trait::async_trait;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, RenderStepOutput, StepOutcome};
use crate::render::{RenderError, RenderInvoker};

/// Runs the render engine for the compiled graph.
///
/// Engine failures are returned unchanged so their stderr reaches the
/// outcome verbatim.
pub struct RenderStep {
    invoker: Arc<RenderInvoker>,
    show_command_pretty: bool,
}

impl RenderStep {
    pub fn new(invoker: Arc<RenderInvoker>) -> Self {
        Self {
            invoker,
            show_command_pretty: false,
        }
    }

    /// Also log the command one option per line.
    pub fn with_command_pretty(mut self, enabled: bool) -> Self {
        self.show_command_pretty = enabled;
        self
    }
}

#[async_trait]
impl PipelineStep for RenderStep {
    fn name(&self) -> &str {
        "Render"
    }

    fn description(&self) -> &str {
        "Render the mix with the engine"
    }

    fn validate_input(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_graph() {
            return Err(StepError::invalid_output("no filter graph to render"));
        }
        Ok(())
    }

    async fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let graph = state
            .graph
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("no filter graph to render"))?;
        let job = &ctx.job;

        if self.show_command_pretty {
            let args: Vec<String> = self
                .invoker
                .build_args(graph, &job.stems, &job.settings, &ctx.staging_path)
                .iter()
                .map(|a| a.to_string_lossy().to_string())
                .collect();
            ctx.logger
                .command_pretty(&self.invoker.engine_path().display().to_string(), &args);
        }

        ctx.logger.section("Executing render engine");
        let result = self
            .invoker
            .execute(graph, &job.stems, &job.settings, &ctx.staging_path, &ctx.cancel)
            .await;

        match result {
            Ok(output) => {
                ctx.logger.command(&output.command);
                ctx.logger.engine_output(&output.diagnostics);
                ctx.logger.info(&format!(
                    "Engine finished in {:.2}s",
                    output.elapsed.as_secs_f64()
                ));

                state.render = Some(RenderStepOutput {
                    rendered_path: output.output_path,
                    command: output.command,
                    diagnostics: output.diagnostics,
                    elapsed: output.elapsed,
                });
                Ok(StepOutcome::Success)
            }
            Err(e) => {
                if let RenderError::Engine { diagnostic, .. }
                | RenderError::Cancelled { diagnostic }
                | RenderError::TimedOut { diagnostic, .. } = &e
                {
                    ctx.logger.engine_output(&String::from_utf8_lossy(diagnostic));
                    ctx.logger.dump_tail("render engine output");
                }
                Err(e.into())
            }
        }
    }

    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()> {
        let rendered = state
            .render
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("render result not recorded"))?;

        if rendered.rendered_path != ctx.staging_path {
            return Err(StepError::invalid_output(format!(
                "engine wrote {} instead of {}",
                rendered.rendered_path.display(),
                ctx.staging_path.display()
            )));
        }
        Ok(())
    }
}
