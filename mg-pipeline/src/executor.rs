//! `PipelineExecutor` — runs an ordered list of steps against a shared
//! `PipelineContext`, resolving each step's inputs from prior results and
//! persisting execution status as it goes (spec.md §4.4 "Pipeline
//! executor" steps 1-4). Grounded on `executor.py`'s
//! `PipelineExecutor.execute_functional`, functional mode only — the
//! context-mutation branch in the source has no counterpart here (spec.md
//! §9 redesign note).

use std::collections::HashMap;

use mg_core::ExecutionStatus;
use mg_store::JobExecution;
use tracing::{info, instrument, warn};

use crate::builder::PipelineStep;
use crate::context::PipelineContext;
use crate::error::{PipelineError, StepError};
use crate::input_resolver::resolve_inputs;
use crate::result::{ResultManager, StepResult};
use crate::status::StatusUpdater;

const EXECUTOR_STEP: &str = "PipelineExecutor";

pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Runs `steps` in order against `ctx`, persisting status transitions
    /// through `status` on `execution`. Returns the full result map on
    /// success (spec.md §4.4 step 4); on the first step failure, persists
    /// `FAILED` and returns a `PipelineError` (spec.md §4.4 step 3).
    #[instrument(skip(steps, ctx, execution, status), fields(job_id = %ctx.job_id, steps = steps.len()))]
    pub async fn run(
        steps: &[PipelineStep],
        ctx: &PipelineContext,
        execution: &mut JobExecution,
        status: &dyn StatusUpdater,
    ) -> Result<HashMap<&'static str, StepResult>, PipelineError> {
        let total = steps.len();

        if total == 0 {
            warn!(job_id = %ctx.job_id, "pipeline has no steps to run");
            return Ok(HashMap::new());
        }

        status
            .update_execution_status(execution, ExecutionStatus::Running, format!("Pipeline started, {total} steps"))
            .await
            .map_err(|e| PipelineError::new(ctx.job_id.to_string(), StepError::Store { step_name: EXECUTOR_STEP, source: e }))?;

        let mut results = ResultManager::new();

        for (index, pipeline_step) in steps.iter().enumerate() {
            let step = pipeline_step.as_step();
            let position = index + 1;

            if let PipelineStep::Conditional(cond) = pipeline_step {
                if !cond.should_execute(ctx) {
                    info!(job_id = %ctx.job_id, step = step.name(), "step skipped (condition not met)");
                    status
                        .update_execution_status(
                            execution,
                            ExecutionStatus::Running,
                            format!("{}(skipped) ({position}/{total})", step.name()),
                        )
                        .await
                        .map_err(|e| PipelineError::new(ctx.job_id.to_string(), StepError::Store { step_name: EXECUTOR_STEP, source: e }))?;
                    continue;
                }
            }

            info!(job_id = %ctx.job_id, step = step.name(), "running step {}/{}", position, total);
            status
                .update_execution_status(execution, ExecutionStatus::Running, format!("Running: {} ({position}/{total})", step.name()))
                .await
                .map_err(|e| PipelineError::new(ctx.job_id.to_string(), StepError::Store { step_name: EXECUTOR_STEP, source: e }))?;

            let inputs = resolve_inputs(step.name(), &results, ctx);

            if let Err(validation_err) = step.validate(ctx, &inputs) {
                let step_error = StepError::Validation { step_name: step.name(), source: validation_err };
                return Self::fail(ctx, execution, status, step_error).await;
            }

            let result = match step.execute(ctx, inputs).await {
                Ok(result) => result,
                Err(step_error) => return Self::fail(ctx, execution, status, step_error).await,
            };

            step.post_process(ctx, &result).await;
            results.store(result);
        }

        info!(job_id = %ctx.job_id, "pipeline completed successfully");
        Ok(results.into_all())
    }

    async fn fail(
        ctx: &PipelineContext,
        execution: &mut JobExecution,
        status: &dyn StatusUpdater,
        step_error: StepError,
    ) -> Result<HashMap<&'static str, StepResult>, PipelineError> {
        let message = format!("Failed step '{}'", step_error.step_name());
        warn!(job_id = %ctx.job_id, step = step_error.step_name(), error = %step_error, "pipeline step failed");

        // Best-effort: a failure to persist FAILED shouldn't mask the
        // original step failure, which is what the caller needs to act on.
        let _ = status.update_execution_status(execution, ExecutionStatus::Failed, message).await;

        Err(PipelineError::new(ctx.job_id.to_string(), step_error))
    }
}
