//! `SubtitleStep`: post-processes the raw subtitle file `TtsStep` produced —
//! optional simplified-to-traditional conversion, then format validation and
//! counting — grounded on `subtitle_step.py`'s `SubtitleGenerationStep`.

use async_trait::async_trait;
use mg_pipeline::{PipelineContext, Step, StepError, StepInputs, StepResult, SubtitleResult, ValidationError};
use serde_json::json;

use crate::srt::{convert_to_traditional, count_subtitle_blocks};

pub struct SubtitleStep;

impl SubtitleStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SubtitleStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for SubtitleStep {
    fn name(&self) -> &'static str {
        "SubtitleStep"
    }

    fn description(&self) -> &'static str {
        "Validate the synthesized subtitle file, converting to traditional Chinese if configured"
    }

    fn validate(&self, _ctx: &PipelineContext, inputs: &StepInputs) -> Result<(), ValidationError> {
        inputs.require_srt_path(self.name())?;
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError> {
        let raw_srt_path = inputs.require_srt_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;

        let content = tokio::fs::read_to_string(raw_srt_path).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;

        let wants_traditional = ctx
            .extras
            .get("traditional_chinese")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let (final_path, final_content) = if wants_traditional {
            let converted = convert_to_traditional(&content);
            let path = ctx.workspace_dir.join("audio").join("speech.traditional.srt");
            tokio::fs::write(&path, &converted).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;
            (path.display().to_string(), converted)
        } else {
            (raw_srt_path.to_string(), content)
        };

        let subtitle_count = count_subtitle_blocks(&final_content);
        if subtitle_count == 0 {
            return Err(StepError::Other { step_name: self.name(), message: "subtitle file had no parseable cues".to_string() });
        }

        Ok(StepResult::Subtitle(SubtitleResult {
            srt_path: final_path,
            subtitle_count,
            metadata: json!({ "converted_to_traditional": wants_traditional }),
        }))
    }
}
