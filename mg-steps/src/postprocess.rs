//! `PostProcessStep`: mixes narration onto the composed video, then burns in
//! subtitles and an optional logo, grounded on `video_step.py`'s deferred
//! audio-mix/subtitle responsibilities (see `video.rs`'s module doc) and
//! `core/utils/ffmpeg`'s subtitle-burn helpers.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use mg_pipeline::{PipelineContext, PostProcessResult, Step, StepError, StepInputs, StepResult, ValidationError};
use serde_json::json;

use crate::ffmpeg;

const FFMPEG_TIMEOUT: Duration = Duration::from_secs(180);
const DEFAULT_LOGO_WIDTH: u32 = 100;

/// Subtitle color names recognized on `Account.subtitle_color_name`, mapped
/// to ffmpeg's `PrimaryColour=&HBBGGRR&` BGR hex. Falls back to white.
const SUBTITLE_COLORS: &[(&str, &str)] = &[
    ("white", "FFFFFF"),
    ("yellow", "00FFFF"),
    ("black", "000000"),
    ("red", "0000FF"),
    ("green", "00FF00"),
    ("blue", "FF0000"),
];

fn bgr_for_color_name(name: Option<&str>) -> &'static str {
    name.and_then(|n| SUBTITLE_COLORS.iter().find(|(key, _)| key.eq_ignore_ascii_case(n)))
        .map(|(_, bgr)| *bgr)
        .unwrap_or("FFFFFF")
}

pub struct PostProcessStep;

impl PostProcessStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostProcessStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for PostProcessStep {
    fn name(&self) -> &'static str {
        "PostProcessStep"
    }

    fn description(&self) -> &'static str {
        "Mix narration audio into the composite video and burn in subtitles and the account logo"
    }

    fn validate(&self, _ctx: &PipelineContext, inputs: &StepInputs) -> Result<(), ValidationError> {
        inputs.require_combined_video(self.name())?;
        inputs.require_audio_path(self.name())?;
        inputs.require_srt_path(self.name())?;
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError> {
        let video_path = inputs.require_combined_video(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;
        let audio_path = inputs.require_audio_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;
        let srt_path = inputs.require_srt_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;

        let output_dir = ctx.workspace_dir.join("final");
        tokio::fs::create_dir_all(&output_dir).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;

        let muxed_path = output_dir.join("muxed.mp4");
        ffmpeg::mux_audio(Path::new(video_path), Path::new(audio_path), &muxed_path, FFMPEG_TIMEOUT)
            .await
            .map_err(|e| StepError::Other { step_name: self.name(), message: e.to_string() })?;

        let bgr_color = bgr_for_color_name(ctx.account.as_ref().and_then(|a| a.subtitle_color_name.as_deref()));
        let logo_path = ctx.logo_path.as_deref().map(Path::new);

        let final_path = output_dir.join("final.mp4");
        ffmpeg::burn_subtitles_and_logo(&muxed_path, Path::new(srt_path), bgr_color, logo_path, DEFAULT_LOGO_WIDTH, &final_path, FFMPEG_TIMEOUT)
            .await
            .map_err(|e| StepError::Other { step_name: self.name(), message: e.to_string() })?;

        let mut processing_steps = vec!["mux_audio".to_string(), "burn_subtitles".to_string()];
        if logo_path.is_some() {
            processing_steps.push("overlay_logo".to_string());
        }

        Ok(StepResult::PostProcess(PostProcessResult {
            final_video_path: final_path.display().to_string(),
            processing_steps,
            metadata: json!({ "subtitle_color": bgr_color }),
        }))
    }
}
