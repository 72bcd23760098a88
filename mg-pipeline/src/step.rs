//! The `Step` trait and its typed input bundle (spec.md §4.4). Grounded on
//! `steps/base.py`'s `BaseStep`/`ConditionalStep`, with the context-mutation
//! compatibility mode dropped (spec.md §9 redesign note) — a step only ever
//! reads `PipelineContext` and the `StepInputs` the resolver built for it,
//! and only ever returns a `StepResult`.

use async_trait::async_trait;
use mg_store::JobSplit;

use crate::context::PipelineContext;
use crate::error::{StepError, ValidationError};
use crate::result::StepResult;

/// The typed kwargs a step needs from upstream results, assembled by the
/// step input resolver (`input_resolver.rs`) before `execute` is called.
/// One shared struct rather than per-step structs: the step set is fixed
/// and small (spec.md §9 "reflection-based schema conversion" resolved as a
/// static table, not codegen), so a single sparsely populated bundle reads
/// more plainly than eight near-identical types.
#[derive(Debug, Clone, Default)]
pub struct StepInputs {
    pub audio_path: Option<String>,
    pub srt_path: Option<String>,
    pub splits: Option<Vec<JobSplit>>,
    pub image_paths: Option<Vec<String>>,
    pub video_path: Option<String>,
    pub combined_video: Option<String>,
    pub final_video_path: Option<String>,
}

impl StepInputs {
    pub fn require_audio_path(&self, step: &'static str) -> Result<&str, ValidationError> {
        self.audio_path.as_deref().ok_or(ValidationError::MissingInput { step, field: "audio_path" })
    }

    pub fn require_srt_path(&self, step: &'static str) -> Result<&str, ValidationError> {
        self.srt_path.as_deref().ok_or(ValidationError::MissingInput { step, field: "srt_path" })
    }

    pub fn require_splits(&self, step: &'static str) -> Result<&[JobSplit], ValidationError> {
        self.splits.as_deref().ok_or(ValidationError::MissingInput { step, field: "splits" })
    }

    pub fn require_image_paths(&self, step: &'static str) -> Result<&[String], ValidationError> {
        self.image_paths.as_deref().ok_or(ValidationError::MissingInput { step, field: "image_paths" })
    }

    pub fn require_combined_video(&self, step: &'static str) -> Result<&str, ValidationError> {
        self.combined_video.as_deref().ok_or(ValidationError::MissingInput { step, field: "combined_video" })
    }

    pub fn require_final_video_path(&self, step: &'static str) -> Result<&str, ValidationError> {
        self.final_video_path.as_deref().ok_or(ValidationError::MissingInput { step, field: "final_video_path" })
    }
}

/// A single unit of pipeline work (spec.md §4.4).
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        ""
    }

    /// Validate preconditions before `execute` runs. Default: always valid.
    fn validate(&self, _ctx: &PipelineContext, _inputs: &StepInputs) -> Result<(), ValidationError> {
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError>;

    /// Optional post-processing hook (cleanup, extra logging). Default: no-op.
    async fn post_process(&self, _ctx: &PipelineContext, _result: &StepResult) {}
}

/// A step that may be skipped entirely depending on job configuration
/// (spec.md §4.5 `DigitalHumanStep`), grounded on `steps/base.py`'s
/// `ConditionalStep`.
#[async_trait]
pub trait ConditionalStep: Step {
    fn should_execute(&self, ctx: &PipelineContext) -> bool;
}
