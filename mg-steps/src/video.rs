//! `VideoStep`: turns each scene's image into a fixed-duration clip and
//! concatenates them into a silent composite, grounded on `video_step.py`'s
//! `VideoCompositionStep._create_video_segments`/`_merge_video_segments`.
//! Audio mixing and subtitle burn-in are deliberately left to
//! `PostProcessStep`, matching the source's actual division of labor despite
//! its docstring claiming otherwise.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use mg_pipeline::{PipelineContext, Step, StepError, StepInputs, StepResult, ValidationError, VideoResult};
use serde_json::json;
use tokio::task::JoinSet;

use crate::ffmpeg::{self, Resolution};

/// `VideoProcessingConfig.duration_per_image` default.
const DURATION_PER_IMAGE_SECS: f64 = 5.0;
const FFMPEG_TIMEOUT: Duration = Duration::from_secs(120);
const PARALLEL_THRESHOLD: usize = 3;

pub struct VideoStep;

impl VideoStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VideoStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for VideoStep {
    fn name(&self) -> &'static str {
        "VideoStep"
    }

    fn description(&self) -> &'static str {
        "Render each scene image into a clip and concatenate them into a silent composite"
    }

    fn validate(&self, _ctx: &PipelineContext, inputs: &StepInputs) -> Result<(), ValidationError> {
        let paths = inputs.require_image_paths(self.name())?;
        if paths.is_empty() {
            return Err(ValidationError::Invalid { step: self.name(), message: "no images to compose into video".to_string() });
        }
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError> {
        let image_paths = inputs.require_image_paths(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;

        let video_dir = ctx.workspace_dir.join("video");
        tokio::fs::create_dir_all(&video_dir).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;

        let resolution = Resolution::for_horizontal(ctx.is_horizontal());
        let enable_transitions = ctx.topic_extras.enable_srt_concat_transition;
        let mut segment_paths = vec![PathBuf::new(); image_paths.len()];

        if image_paths.len() >= PARALLEL_THRESHOLD {
            let mut tasks = JoinSet::new();
            for (index, image_path) in image_paths.iter().enumerate() {
                let image_path = PathBuf::from(image_path);
                let output_path = video_dir.join(format!("segment_{index:03}.mp4"));
                tasks.spawn(async move {
                    let result = ffmpeg::image_to_video(&image_path, &output_path, DURATION_PER_IMAGE_SECS, resolution, FFMPEG_TIMEOUT).await;
                    (index, output_path, result)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let (index, output_path, result) = joined.map_err(|e| StepError::Other { step_name: self.name(), message: format!("video segment task panicked: {e}") })?;
                result.map_err(|e| StepError::Other { step_name: self.name(), message: e.to_string() })?;
                segment_paths[index] = output_path;
            }
        } else {
            for (index, image_path) in image_paths.iter().enumerate() {
                let output_path = video_dir.join(format!("segment_{index:03}.mp4"));
                ffmpeg::image_to_video(std::path::Path::new(image_path), &output_path, DURATION_PER_IMAGE_SECS, resolution, FFMPEG_TIMEOUT)
                    .await
                    .map_err(|e| StepError::Other { step_name: self.name(), message: e.to_string() })?;
                segment_paths[index] = output_path;
            }
        }

        let transitions: Vec<&'static str> = (0..segment_paths.len()).map(|i| ffmpeg::transition_for_index(i, enable_transitions)).collect();

        let list_file = video_dir.join("concat.txt");
        let list_contents: String = segment_paths.iter().map(|p| format!("file '{}'\n", p.display())).collect();
        tokio::fs::write(&list_file, list_contents).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;

        let composite_path = video_dir.join("composite.mp4");
        ffmpeg::concat_segments(&list_file, &composite_path, FFMPEG_TIMEOUT)
            .await
            .map_err(|e| StepError::Other { step_name: self.name(), message: e.to_string() })?;

        Ok(StepResult::Video(VideoResult {
            video_path: composite_path.display().to_string(),
            duration_secs: segment_paths.len() as f64 * DURATION_PER_IMAGE_SECS,
            segment_count: segment_paths.len(),
            metadata: json!({ "transitions": transitions }),
        }))
    }
}
