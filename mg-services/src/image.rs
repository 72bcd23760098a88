use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, ensure_success, with_deadline};
use crate::{ServiceError, ServiceResult};

/// A single LoRA adapter applied to a generation request.
#[derive(Debug, Clone, Serialize)]
pub struct LoraSpec {
    pub name: String,
    pub weight: f32,
}

/// Request to generate one image, grounded on `image_client.py`'s
/// `generate_single_image` / `generate_image` (`/generate_image/` payload).
#[derive(Debug, Clone, Serialize)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loras: Vec<LoraSpec>,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>, width: u32, height: u32) -> Self {
        Self { prompt: prompt.into(), width, height, num_inference_steps: 30, loras: Vec::new() }
    }

    pub fn with_inference_steps(mut self, steps: u32) -> Self {
        self.num_inference_steps = steps;
        self
    }

    /// Mirrors `generate_single_image`'s `lora_weight` default of `1.2`.
    pub fn with_lora(mut self, name: impl Into<String>, weight: f32) -> Self {
        self.loras.push(LoraSpec { name: name.into(), weight });
        self
    }
}

/// Result of generating one image. `image_bytes` holds the raw PNG/JPEG
/// content regardless of which wire shape the upstream service used to
/// deliver it (binary body, or JSON with a base64 `image` field) — both
/// branches of `image_client.py`'s `generate_image` collapse to this.
#[derive(Debug, Clone)]
pub struct ImageGenerationResponse {
    pub image_bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct JsonImageBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_single_image(&self, request: ImageGenerationRequest) -> ServiceResult<ImageGenerationResponse>;

    /// Sequential batch, mirroring `generate_batch`'s plain for-loop — fan-out
    /// concurrency across scenes is `mg-steps::ImageStep`'s job, not this trait's.
    async fn generate_batch(&self, requests: Vec<ImageGenerationRequest>) -> Vec<ServiceResult<ImageGenerationResponse>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.generate_single_image(request).await);
        }
        results
    }
}

/// HTTP-backed image generation client. Default 300s timeout, matching
/// `generate_image_sync`'s `run_async(_generate, timeout=300)`.
pub struct HttpImageGenerationService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpImageGenerationService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: build_client(Duration::from_secs(10)), base_url: base_url.into(), timeout: Duration::from_secs(300) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ImageGenerationService for HttpImageGenerationService {
    async fn generate_single_image(&self, request: ImageGenerationRequest) -> ServiceResult<ImageGenerationResponse> {
        let url = format!("{}/generate_image/", self.base_url);
        let client = self.client.clone();

        with_deadline(self.timeout, "image generation", async move {
            let response = client.post(&url).json(&request).send().await?;
            let response = ensure_success(response).await?;

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            if content_type.contains("image") {
                let bytes = response.bytes().await?;
                return Ok(ImageGenerationResponse { image_bytes: bytes.to_vec() });
            }

            if content_type.contains("application/json") {
                let body: JsonImageBody = response.json().await
                    .map_err(|e| ServiceError::PermanentServer(e.to_string()))?;

                if let Some(error) = body.error {
                    return Err(ServiceError::PermanentServer(format!("image generation failed: {error}")));
                }

                if let Some(encoded) = body.image {
                    let decoded = base64::engine::general_purpose::STANDARD
                        .decode(encoded)
                        .map_err(|e| ServiceError::PermanentServer(format!("invalid base64 image: {e}")))?;
                    return Ok(ImageGenerationResponse { image_bytes: decoded });
                }

                return Err(ServiceError::PermanentServer("response had no image payload".to_string()));
            }

            // Unknown content type: treat the body as raw bytes, same fallback
            // `generate_image` takes for anything it doesn't recognize.
            let bytes = response.bytes().await?;
            Ok(ImageGenerationResponse { image_bytes: bytes.to_vec() })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_loras_when_empty() {
        let req = ImageGenerationRequest::new("a cat", 1024, 768);
        let value = serde_json::to_value(&req).unwrap();
        assert!(value.get("loras").is_none());
    }

    #[test]
    fn with_lora_serializes_weight() {
        let req = ImageGenerationRequest::new("a cat", 1024, 768).with_lora("style-x", 1.2);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["loras"][0]["weight"], 1.2);
    }
}
