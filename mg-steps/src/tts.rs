//! `TtsStep`: synthesizes narration audio and its matching raw subtitle file
//! in a single call, grounded on `tts_step.py`'s `TTSStep._execute_functional`.

use std::sync::Arc;

use async_trait::async_trait;
use mg_pipeline::{PipelineContext, Step, StepError, StepInputs, StepResult, TtsResult};
use mg_services::{TtsRequest, TtsService};
use serde_json::json;

use crate::ffmpeg::probe_duration;

pub struct TtsStep {
    service: Arc<dyn TtsService>,
}

impl TtsStep {
    pub fn new(service: Arc<dyn TtsService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Step for TtsStep {
    fn name(&self) -> &'static str {
        "TtsStep"
    }

    fn description(&self) -> &'static str {
        "Synthesize narration audio and a raw subtitle file from the job script"
    }

    async fn execute(&self, ctx: &PipelineContext, _inputs: StepInputs) -> Result<StepResult, StepError> {
        let audio_dir = ctx.workspace_dir.join("audio");
        tokio::fs::create_dir_all(&audio_dir).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;

        let audio_path = audio_dir.join("speech.wav");
        let srt_path = audio_dir.join("speech.srt");

        let request = TtsRequest::new(ctx.content.clone(), audio_path.display().to_string(), srt_path.display().to_string())
            .with_voice(ctx.provider_voice_id.clone())
            .with_speech_rate(ctx.speech_speed);

        let response = self.service.synthesize(request).await.map_err(|source| StepError::from_service(self.name(), source))?;

        let duration_secs = probe_duration(std::path::Path::new(&response.audio_path)).await;

        Ok(StepResult::Tts(TtsResult {
            audio_path: response.audio_path,
            srt_path: response.subtitle_path,
            duration_secs,
            metadata: json!({ "language": ctx.language_code, "platform": ctx.language_platform }),
        }))
    }
}
