//! `UploadStep`: hands the finished assets to object storage, grounded on
//! `upload_step.py`'s `UploadStep._execute_functional` and
//! `file_uploader.py`'s key layout.

use std::sync::Arc;

use async_trait::async_trait;
use mg_pipeline::{PipelineContext, Step, StepError, StepInputs, StepResult, UploadOutcome, UploadResult, ValidationError};
use mg_services::{byte_stream_from_bytes, BatchUploadItem, BlobCtx, BlobPut, FileStorageService};

pub struct UploadStep {
    service: Arc<dyn FileStorageService>,
}

impl UploadStep {
    pub fn new(service: Arc<dyn FileStorageService>) -> Self {
        Self { service }
    }

    async fn read_item(file_type: &str, path: &str, content_type: &str) -> Result<BatchUploadItem, std::io::Error> {
        let bytes = tokio::fs::read(path).await?;
        let size = bytes.len() as u64;
        let put = BlobPut::new().with_content_type(content_type).with_filename(file_type).with_size_hint(size);
        Ok(BatchUploadItem { file_type: file_type.to_string(), put, body: byte_stream_from_bytes(bytes.into()) })
    }
}

#[async_trait]
impl Step for UploadStep {
    fn name(&self) -> &'static str {
        "UploadStep"
    }

    fn description(&self) -> &'static str {
        "Upload the final video, cover image, narration, and subtitle file to object storage"
    }

    fn validate(&self, _ctx: &PipelineContext, inputs: &StepInputs) -> Result<(), ValidationError> {
        inputs.require_final_video_path(self.name())?;
        inputs.require_image_paths(self.name())?;
        inputs.require_audio_path(self.name())?;
        inputs.require_srt_path(self.name())?;
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError> {
        let video_path = inputs.require_final_video_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;
        let image_paths = inputs.require_image_paths(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;
        let audio_path = inputs.require_audio_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;
        let srt_path = inputs.require_srt_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;

        let cover_path = image_paths.first().ok_or_else(|| StepError::Other { step_name: self.name(), message: "no cover image available".to_string() })?;

        let items = vec![
            Self::read_item("video", video_path, "video/mp4").await.map_err(|source| StepError::Io { step_name: self.name(), source })?,
            Self::read_item("cover", cover_path, "image/png").await.map_err(|source| StepError::Io { step_name: self.name(), source })?,
            Self::read_item("audio", audio_path, "audio/wav").await.map_err(|source| StepError::Io { step_name: self.name(), source })?,
            Self::read_item("srt", srt_path, "application/x-subrip").await.map_err(|source| StepError::Io { step_name: self.name(), source })?,
        ];

        let prefix = format!("videos/{}/{}", ctx.user_id.no_dashes(), ctx.job_id);

        let batch = self
            .service
            .upload_batch(BlobCtx::new(), &prefix, items)
            .await
            .map_err(|source| StepError::from_service(self.name(), source))?;

        if let Some(video_result) = batch.results.get("video") {
            if video_result.file_key.is_none() {
                return Err(StepError::Other {
                    step_name: self.name(),
                    message: format!(
                        "video upload failed: {}",
                        video_result.error_message.as_deref().unwrap_or("no key returned")
                    ),
                });
            }
        }

        let mut urls = std::collections::HashMap::new();
        let mut sizes = std::collections::HashMap::new();

        for (file_type, result) in &batch.results {
            if let Some(key) = &result.file_key {
                let canonical = format!("{file_type}_oss_key");
                urls.insert(canonical, key.clone());
            }
        }
        sizes.insert("total".to_string(), batch.total_size);

        let status = if batch.failed_count == 0 { UploadOutcome::Success } else { UploadOutcome::Partial };

        Ok(StepResult::Upload(UploadResult {
            urls,
            status,
            sizes,
            metadata: serde_json::json!({ "success_count": batch.success_count, "failed_count": batch.failed_count }),
        }))
    }
}
