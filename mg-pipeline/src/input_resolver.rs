//! Step input resolver: computes each step's `StepInputs` from the results
//! of specific upstream steps (spec.md §4.4). Grounded on
//! `input_resolver.py`'s `StepInputResolver.resolve_inputs`, a `match` over
//! step name instead of a chain of `if/elif`, and over a typed
//! `ResultManager` instead of a loosely typed results dict.

use crate::context::PipelineContext;
use crate::result::{ResultManager, StepResult};
use crate::step::StepInputs;

/// Builds the `StepInputs` for `step_name` from whatever upstream results
/// have been stored so far. Returns a sparse bundle — fields the step
/// doesn't need are left `None`; fields it needs but can't find stay `None`
/// too, and `Step::validate` is responsible for rejecting that.
pub fn resolve_inputs(step_name: &str, results: &ResultManager, ctx: &PipelineContext) -> StepInputs {
    let mut inputs = StepInputs::default();

    match step_name {
        "SubtitleStep" => {
            if let Some(StepResult::Tts(tts)) = results.get("TtsStep") {
                inputs.srt_path = Some(tts.srt_path.clone());
            }
        }
        "SplitStep" => {
            if let Some(StepResult::Subtitle(sub)) = results.get("SubtitleStep") {
                inputs.srt_path = Some(sub.srt_path.clone());
            }
        }
        "ImageStep" => {
            if let Some(StepResult::Split(split)) = results.get("SplitStep") {
                inputs.splits = Some(split.splits.clone());
            }
        }
        "VideoStep" => {
            if let Some(StepResult::Image(image)) = results.get("ImageStep") {
                inputs.image_paths = Some(image.image_paths.clone());
            }
            if let Some(StepResult::Tts(tts)) = results.get("TtsStep") {
                inputs.audio_path = Some(tts.audio_path.clone());
            }
        }
        "DigitalHumanStep" => {
            if let Some(StepResult::Video(video)) = results.get("VideoStep") {
                inputs.combined_video = Some(video.video_path.clone());
            }
            if let Some(StepResult::Tts(tts)) = results.get("TtsStep") {
                inputs.audio_path = Some(tts.audio_path.clone());
            }
        }
        "PostProcessStep" => {
            // The human overlay, if it ran and produced a video, supersedes
            // the plain composited video (spec.md §4.5 DigitalHumanStep note).
            let combined_video = match results.get("DigitalHumanStep") {
                Some(StepResult::DigitalHuman(human)) if human.video_path.is_some() => human.video_path.clone(),
                _ => results.get("VideoStep").and_then(|r| match r {
                    StepResult::Video(video) => Some(video.video_path.clone()),
                    _ => None,
                }),
            };
            inputs.combined_video = combined_video;

            if let Some(StepResult::Tts(tts)) = results.get("TtsStep") {
                inputs.audio_path = Some(tts.audio_path.clone());
            }
            if let Some(StepResult::Subtitle(sub)) = results.get("SubtitleStep") {
                inputs.srt_path = Some(sub.srt_path.clone());
            }
        }
        "UploadStep" => {
            if let Some(StepResult::PostProcess(pp)) = results.get("PostProcessStep") {
                inputs.final_video_path = Some(pp.final_video_path.clone());
            }
            if let Some(StepResult::Image(image)) = results.get("ImageStep") {
                inputs.image_paths = Some(image.image_paths.clone());
            }
            if let Some(StepResult::Tts(tts)) = results.get("TtsStep") {
                inputs.audio_path = Some(tts.audio_path.clone());
            }
            if let Some(StepResult::Subtitle(sub)) = results.get("SubtitleStep") {
                inputs.srt_path = Some(sub.srt_path.clone());
            }
        }
        // "TtsStep" and any unrecognized step reads only from `ctx`.
        _ => {}
    }

    let _ = ctx;
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TtsResult;
    use serde_json::Value;

    fn ctx() -> PipelineContext {
        use mg_core::{ExecutionId, JobId, UserId};
        use mg_store::Orientation;

        PipelineContext {
            job_id: JobId::new(),
            execution_id: ExecutionId::new(),
            user_id: UserId::new(),
            workspace_dir: "/tmp".into(),
            title: String::new(),
            content: String::new(),
            language_code: "en".into(),
            language_platform: "edge".into(),
            voice_id: "v".into(),
            provider_voice_id: "v".into(),
            speech_speed: 1.0,
            orientation: Orientation::Landscape,
            reference_audio_path: None,
            logo_path: None,
            topic_prompts: None,
            style_adapter_list: vec![],
            account: None,
            extras: Value::Null,
            started_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn subtitle_step_pulls_srt_path_from_tts() {
        let mut results = ResultManager::new();
        results.store(StepResult::Tts(TtsResult {
            audio_path: "a.wav".into(),
            srt_path: "a.srt".into(),
            duration_secs: 1.0,
            metadata: Value::Null,
        }));

        let inputs = resolve_inputs("SubtitleStep", &results, &ctx());
        assert_eq!(inputs.srt_path.as_deref(), Some("a.srt"));
        assert!(inputs.audio_path.is_none());
    }

    #[test]
    fn digital_human_step_pulls_combined_video_from_video_step() {
        use crate::result::VideoResult;

        let mut results = ResultManager::new();
        results.store(StepResult::Video(VideoResult { video_path: "v.mp4".into(), duration_secs: 1.0, segment_count: 1, metadata: Value::Null }));

        let inputs = resolve_inputs("DigitalHumanStep", &results, &ctx());
        assert_eq!(inputs.combined_video.as_deref(), Some("v.mp4"));
        assert!(inputs.video_path.is_none());
    }

    #[test]
    fn unrecognized_step_has_no_inputs() {
        let results = ResultManager::new();
        let inputs = resolve_inputs("TtsStep", &results, &ctx());
        assert!(inputs.audio_path.is_none());
        assert!(inputs.splits.is_none());
    }
}
