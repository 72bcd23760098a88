use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, ensure_success, with_deadline};
use crate::ServiceResult;

/// Where the digital-human overlay sits in frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitalHumanMode {
    Fullscreen,
    Corner,
}

impl Default for DigitalHumanMode {
    fn default() -> Self {
        Self::Fullscreen
    }
}

/// Request to composite a digital-human presenter over a scene video,
/// grounded on `digital_human_service.py`'s `generate_digital_human`.
#[derive(Debug, Clone, Serialize)]
pub struct DigitalHumanRequest {
    pub account_name: String,
    pub origin_video_path: String,
    pub audio_path: String,
    pub json_path: String,
    pub account_extra: serde_json::Value,
    pub mode: DigitalHumanMode,
    pub enable_transition: bool,
}

impl DigitalHumanRequest {
    pub fn new(
        account_name: impl Into<String>,
        origin_video_path: impl Into<String>,
        audio_path: impl Into<String>,
        json_path: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            origin_video_path: origin_video_path.into(),
            audio_path: audio_path.into(),
            json_path: json_path.into(),
            account_extra: serde_json::Value::Null,
            mode: DigitalHumanMode::default(),
            enable_transition: false,
        }
    }

    pub fn with_mode(mut self, mode: DigitalHumanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_transition(mut self, enable: bool) -> Self {
        self.enable_transition = enable;
        self
    }

    pub fn with_account_extra(mut self, account_extra: serde_json::Value) -> Self {
        self.account_extra = account_extra;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DigitalHumanResponse {
    pub video_path: String,
}

/// Digital-human overlay is a best-effort enhancement, not a hard pipeline
/// dependency (`human_step.py`'s non-fatal failure path): a failed call
/// degrades to "no overlay" at the step level, but the trait itself still
/// reports failures as errors — the step decides whether that's fatal.
#[async_trait]
pub trait DigitalHumanService: Send + Sync {
    async fn generate(&self, request: DigitalHumanRequest) -> ServiceResult<DigitalHumanResponse>;
}

#[derive(Deserialize)]
struct GenerateWireResponse {
    success: bool,
    #[serde(default)]
    video_path: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP-backed digital-human client, posting to `{base_url}/human/generate`
/// (grounded on `settings.HUMAN_SERVICE_URL` + `/human/generate` in
/// `digital_human_service.py`).
pub struct HttpDigitalHumanService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDigitalHumanService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: build_client(Duration::from_secs(10)), base_url: base_url.into(), timeout: Duration::from_secs(600) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DigitalHumanService for HttpDigitalHumanService {
    async fn generate(&self, request: DigitalHumanRequest) -> ServiceResult<DigitalHumanResponse> {
        let url = format!("{}/human/generate", self.base_url);
        let client = self.client.clone();

        with_deadline(self.timeout, "digital human generation", async move {
            let response = client.post(&url).json(&request).send().await?;
            let response = ensure_success(response).await?;
            let wire: GenerateWireResponse = response.json().await
                .map_err(|e| crate::ServiceError::PermanentServer(e.to_string()))?;

            if !wire.success {
                return Err(crate::ServiceError::PermanentServer(
                    wire.error.unwrap_or_else(|| "digital human generation failed".to_string()),
                ));
            }

            let video_path = wire.video_path.ok_or_else(|| {
                crate::ServiceError::PermanentServer("success response missing video_path".to_string())
            })?;

            Ok(DigitalHumanResponse { video_path })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_fullscreen() {
        let req = DigitalHumanRequest::new("acct", "origin.mp4", "audio.wav", "data.json");
        assert_eq!(req.mode, DigitalHumanMode::Fullscreen);
        assert!(!req.enable_transition);
    }
}
