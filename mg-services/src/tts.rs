use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, ensure_success, with_deadline};
use crate::ServiceResult;

/// Request to synthesize speech, grounded on `tts_client.py`'s
/// `_build_synthesis_data` / `/asr_service` payload.
#[derive(Debug, Clone, Serialize)]
pub struct TtsRequest {
    pub text: String,
    /// Mirrors the Python client sending the same text under both `text`
    /// and `audio_text` — the upstream service reads either field.
    pub audio_text: String,
    pub voice: String,
    /// 0-100.
    pub volume: u8,
    pub speech_rate: f32,
    pub audio_output_path: String,
    pub subtitle_output_path: String,
}

impl TtsRequest {
    pub fn new(text: impl Into<String>, audio_output_path: impl Into<String>, subtitle_output_path: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            audio_text: text.clone(),
            text,
            voice: "zh-CN-XiaoqiuNeural".to_string(),
            volume: 50,
            speech_rate: 1.0,
            audio_output_path: audio_output_path.into(),
            subtitle_output_path: subtitle_output_path.into(),
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume.min(100);
        self
    }

    pub fn with_speech_rate(mut self, speech_rate: f32) -> Self {
        self.speech_rate = speech_rate;
        self
    }
}

/// Result of a synthesis call. The upstream service writes the audio/subtitle
/// files to the requested paths and reports only whether it succeeded;
/// duration is measured client-side by whoever reads the audio file back
/// (grounded on `tts_client.py`'s `_get_audio_duration`, which falls back to
/// `0.0` when no audio-decoding library is available — this crate has no
/// equivalent of `librosa`, so `duration_secs` is always populated by the
/// caller after the fact, not by this trait).
#[derive(Debug, Clone, Deserialize)]
pub struct TtsResponse {
    pub audio_path: String,
    pub subtitle_path: String,
}

#[async_trait]
pub trait TtsService: Send + Sync {
    async fn synthesize(&self, request: TtsRequest) -> ServiceResult<TtsResponse>;
}

/// HTTP-backed TTS client. `timeout` defaults to 1800s (30 minutes), matching
/// `synthesize_async`'s `timeout=1800` — synthesis of long scripts is slow.
pub struct HttpTtsService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTtsService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: build_client(Duration::from_secs(10)), base_url: base_url.into(), timeout: Duration::from_secs(1800) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TtsService for HttpTtsService {
    async fn synthesize(&self, request: TtsRequest) -> ServiceResult<TtsResponse> {
        let url = format!("{}/asr_service", self.base_url);
        let client = self.client.clone();

        with_deadline(self.timeout, "tts synthesize", async move {
            let response = client.post(&url).json(&request).send().await?;
            let response = ensure_success(response).await?;

            // The upstream service writes the files itself; it may or may not
            // echo their paths back in the body, so fall back to what we asked
            // for rather than failing a 2xx response over an empty/odd body.
            if let Ok(body) = response.json::<TtsResponse>().await {
                return Ok(body);
            }

            Ok(TtsResponse {
                audio_path: request.audio_output_path.clone(),
                subtitle_path: request.subtitle_output_path.clone(),
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_match_upstream() {
        let req = TtsRequest::new("hello", "out.wav", "out.srt");
        assert_eq!(req.voice, "zh-CN-XiaoqiuNeural");
        assert_eq!(req.volume, 50);
        assert_eq!(req.speech_rate, 1.0);
        assert_eq!(req.audio_text, "hello");
    }

    #[test]
    fn volume_is_clamped_to_100() {
        let req = TtsRequest::new("x", "a", "b").with_volume(255);
        assert_eq!(req.volume, 100);
    }
}
