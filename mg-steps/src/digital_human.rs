//! `DigitalHumanStep`: best-effort presenter overlay, grounded on
//! `human_step.py`'s `DigitalHumanStep` — skipped when the job doesn't ask
//! for it or the account has no presenter configured, and non-fatal when
//! the overlay service call itself fails.

use std::sync::Arc;

use async_trait::async_trait;
use mg_pipeline::{ConditionalStep, DigitalHumanResult, PipelineContext, Step, StepError, StepInputs, StepResult, ValidationError};
use mg_services::{DigitalHumanMode, DigitalHumanRequest, DigitalHumanService};
use mg_store::HumanInsertionMode;
use serde_json::json;
use tracing::warn;

use crate::ffmpeg::probe_duration;

pub struct DigitalHumanStep {
    service: Arc<dyn DigitalHumanService>,
}

impl DigitalHumanStep {
    pub fn new(service: Arc<dyn DigitalHumanService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Step for DigitalHumanStep {
    fn name(&self) -> &'static str {
        "DigitalHumanStep"
    }

    fn description(&self) -> &'static str {
        "Composite a digital-human presenter over the scene video, when configured"
    }

    fn validate(&self, _ctx: &PipelineContext, inputs: &StepInputs) -> Result<(), ValidationError> {
        inputs.require_combined_video(self.name())?;
        inputs.require_audio_path(self.name())?;
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError> {
        let video_path = inputs.require_combined_video(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;
        let audio_path = inputs.require_audio_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;

        let Some(account) = ctx.account.as_ref() else {
            return Ok(empty_result());
        };

        let mode = match ctx.topic_extras.human_insertion_mode {
            HumanInsertionMode::Fullscreen => DigitalHumanMode::Fullscreen,
            HumanInsertionMode::Corner => DigitalHumanMode::Corner,
        };

        let request = DigitalHumanRequest::new(
            account.name.clone(),
            video_path,
            audio_path,
            ctx.workspace_dir.join("splits.json").display().to_string(),
        )
        .with_mode(mode)
        .with_transition(ctx.topic_extras.enable_srt_concat_transition);

        match self.service.generate(request).await {
            Ok(response) => {
                let duration_secs = probe_duration(std::path::Path::new(&response.video_path)).await;
                Ok(StepResult::DigitalHuman(DigitalHumanResult {
                    video_path: Some(response.video_path),
                    duration_secs: Some(duration_secs),
                    metadata: json!({ "account": account.name }),
                }))
            }
            Err(err) => {
                warn!(step = self.name(), error = %err, "digital human overlay failed, continuing without it");
                Ok(empty_result())
            }
        }
    }
}

#[async_trait]
impl ConditionalStep for DigitalHumanStep {
    fn should_execute(&self, ctx: &PipelineContext) -> bool {
        ctx.enable_digital_human() && ctx.account.as_ref().map(|a| a.digital_human_video_path.is_some()).unwrap_or(false)
    }
}

fn empty_result() -> StepResult {
    StepResult::DigitalHuman(DigitalHumanResult { video_path: None, duration_secs: None, metadata: json!({}) })
}
