//! `ImageStep`: generates one image per scene, grounded on `image_step.py`'s
//! `ImageGenerationStep` (the retrieved source file truncates before its
//! fan-out logic, so the concurrency threshold below is inferred from
//! `video_step.py`'s equivalent "3 or more segments" parallel/sequential
//! split, which the image stage mirrors one step upstream).

use std::sync::Arc;

use async_trait::async_trait;
use mg_pipeline::{ImageResult, PipelineContext, Step, StepError, StepInputs, StepResult, ValidationError};
use mg_services::{ImageGenerationRequest, ImageGenerationService};
use serde_json::json;
use tokio::task::JoinSet;

use crate::ffmpeg::Resolution;

/// Below this many scenes, generating sequentially is simpler and cheap
/// enough; at or above it the scenes fan out concurrently.
const PARALLEL_THRESHOLD: usize = 3;

pub struct ImageStep {
    service: Arc<dyn ImageGenerationService>,
}

impl ImageStep {
    pub fn new(service: Arc<dyn ImageGenerationService>) -> Self {
        Self { service }
    }

    fn build_request(ctx: &PipelineContext, prompt: &str) -> ImageGenerationRequest {
        let resolution = Resolution::for_horizontal(ctx.is_horizontal());
        let mut request = ImageGenerationRequest::new(prompt, resolution.width, resolution.height);
        for adapter in &ctx.style_adapter_list {
            request = request.with_lora(adapter.name.clone(), adapter.weight);
        }
        request
    }
}

#[async_trait]
impl Step for ImageStep {
    fn name(&self) -> &'static str {
        "ImageStep"
    }

    fn description(&self) -> &'static str {
        "Generate one image per scene, in parallel once there are enough scenes to make it worthwhile"
    }

    fn validate(&self, _ctx: &PipelineContext, inputs: &StepInputs) -> Result<(), ValidationError> {
        let splits = inputs.require_splits(self.name())?;
        if splits.is_empty() {
            return Err(ValidationError::Invalid { step: self.name(), message: "no scenes to generate images for".to_string() });
        }
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError> {
        let splits = inputs.require_splits(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;

        let images_dir = ctx.workspace_dir.join("images");
        tokio::fs::create_dir_all(&images_dir).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;

        let started = std::time::Instant::now();
        let parallel_count = if splits.len() >= PARALLEL_THRESHOLD { splits.len() } else { 1 };

        let mut image_paths = vec![String::new(); splits.len()];

        if splits.len() >= PARALLEL_THRESHOLD {
            let mut tasks = JoinSet::new();
            for (index, split) in splits.iter().enumerate() {
                let request = Self::build_request(ctx, &split.prompt);
                let service = Arc::clone(&self.service);
                let output_path = images_dir.join(format!("scene_{index:03}.png"));
                tasks.spawn(async move {
                    let response = service.generate_single_image(request).await;
                    (index, output_path, response)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                let (index, output_path, response) = joined.map_err(|e| StepError::Other { step_name: self.name(), message: format!("image task panicked: {e}") })?;
                let response = response.map_err(|source| StepError::from_service(self.name(), source))?;
                tokio::fs::write(&output_path, response.image_bytes).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;
                image_paths[index] = output_path.display().to_string();
            }
        } else {
            for (index, split) in splits.iter().enumerate() {
                let request = Self::build_request(ctx, &split.prompt);
                let response = self.service.generate_single_image(request).await.map_err(|source| StepError::from_service(self.name(), source))?;
                let output_path = images_dir.join(format!("scene_{index:03}.png"));
                tokio::fs::write(&output_path, response.image_bytes).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;
                image_paths[index] = output_path.display().to_string();
            }
        }

        Ok(StepResult::Image(ImageResult {
            selected_images: image_paths.clone(),
            image_paths,
            generation_time_ms: started.elapsed().as_millis() as u64,
            parallel_count,
            metadata: json!({ "scene_count": splits.len() }),
        }))
    }
}
