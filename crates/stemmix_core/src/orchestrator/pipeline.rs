//! Sequential step runner.

use super::errors::{PipelineError, PipelineResult, StepResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Ordered list of steps for one job.
///
/// Cancellation is honoured between steps; an engine that is already
/// running is stopped by the render step itself.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run all steps in order. The first error ends the run and comes back
    /// tagged with the job and step names.
    pub async fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineReport> {
        let mut report = PipelineReport::default();
        let total = self.steps.len().max(1) as u32;

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            if ctx.cancel.is_cancelled() {
                ctx.logger.warn(&format!("Cancelled before {}", name));
                return Err(PipelineError::cancelled(&ctx.job_name));
            }

            let percent = index as u32 * 100 / total;
            ctx.logger.step(name);
            ctx.logger.progress(percent);
            ctx.report_progress(name, percent, step.description());

            match run_step(step.as_ref(), ctx, state).await {
                Ok(StepOutcome::Success) => {
                    ctx.logger.done(name);
                    report.completed.push(name.to_string());
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    ctx.logger.info(&format!("{} skipped: {}", name, reason));
                    report.skipped.push(name.to_string());
                }
                Err(e) => {
                    ctx.logger.error(&format!("{}: {}", name, e));
                    return Err(PipelineError::step_failed(&ctx.job_name, name, e));
                }
            }
        }

        ctx.logger.progress(100);
        ctx.report_progress("Done", 100, "All steps finished");
        Ok(report)
    }
}

/// Input check, work, then output check (only when the step did something).
async fn run_step(step: &dyn PipelineStep, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
    step.validate_input(ctx, state)?;
    let outcome = step.execute(ctx, state).await?;
    if outcome == StepOutcome::Success {
        step.validate_output(ctx, state)?;
    }
    Ok(outcome)
}

/// Which steps ran.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
}

impl PipelineReport {
    pub fn total_steps(&self) -> usize {
        self.completed.len() + self.skipped.len()
    }
}
