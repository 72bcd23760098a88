//! `StepResult` — the tagged output of a step (spec.md §4.4, verbatim
//! variant list), and the `ResultManager` that stores them by step name.
//! Grounded on `results/base.py`'s `StepResult` dataclass and
//! `result_manager.py`'s `StepResultManager`, collapsed from a loosely typed
//! `data: Dict[str, Any]` bag into a proper Rust enum — each variant carries
//! exactly the fields its step produces.

use std::collections::HashMap;

use mg_store::JobSplit;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsResult {
    pub audio_path: String,
    /// The raw subtitle file the synthesis call wrote alongside the audio —
    /// `SubtitleStep` takes this path and processes it further (traditional
    /// Chinese conversion, format validation) rather than generating it.
    pub srt_path: String,
    pub duration_secs: f64,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleResult {
    pub srt_path: String,
    pub subtitle_count: usize,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitResult {
    pub splits: Vec<JobSplit>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    pub image_paths: Vec<String>,
    pub selected_images: Vec<String>,
    pub generation_time_ms: u64,
    pub parallel_count: usize,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResult {
    pub video_path: String,
    pub duration_secs: f64,
    pub segment_count: usize,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalHumanResult {
    pub video_path: Option<String>,
    pub duration_secs: Option<f64>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostProcessResult {
    pub final_video_path: String,
    pub processing_steps: Vec<String>,
    pub metadata: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadOutcome {
    Success,
    Partial,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub urls: HashMap<String, String>,
    pub status: UploadOutcome,
    pub sizes: HashMap<String, u64>,
    pub metadata: Value,
}

/// Tagged union of every step's output (spec.md §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepResult {
    Tts(TtsResult),
    Subtitle(SubtitleResult),
    Split(SplitResult),
    Image(ImageResult),
    Video(VideoResult),
    DigitalHuman(DigitalHumanResult),
    PostProcess(PostProcessResult),
    Upload(UploadResult),
}

impl StepResult {
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Tts(_) => "TtsStep",
            Self::Subtitle(_) => "SubtitleStep",
            Self::Split(_) => "SplitStep",
            Self::Image(_) => "ImageStep",
            Self::Video(_) => "VideoStep",
            Self::DigitalHuman(_) => "DigitalHumanStep",
            Self::PostProcess(_) => "PostProcessStep",
            Self::Upload(_) => "UploadStep",
        }
    }

    pub fn metadata(&self) -> &Value {
        match self {
            Self::Tts(r) => &r.metadata,
            Self::Subtitle(r) => &r.metadata,
            Self::Split(r) => &r.metadata,
            Self::Image(r) => &r.metadata,
            Self::Video(r) => &r.metadata,
            Self::DigitalHuman(r) => &r.metadata,
            Self::PostProcess(r) => &r.metadata,
            Self::Upload(r) => &r.metadata,
        }
    }
}

/// Stores step results by step name (spec.md §4.4 "result manager").
#[derive(Debug, Default)]
pub struct ResultManager {
    results: HashMap<&'static str, StepResult>,
}

impl ResultManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, result: StepResult) {
        self.results.insert(result.step_name(), result);
    }

    pub fn get(&self, step_name: &str) -> Option<&StepResult> {
        self.results.get(step_name)
    }

    pub fn get_all(&self) -> &HashMap<&'static str, StepResult> {
        &self.results
    }

    pub fn into_all(self) -> HashMap<&'static str, StepResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_get_round_trips() {
        let mut mgr = ResultManager::new();
        mgr.store(StepResult::Tts(TtsResult {
            audio_path: "a.wav".into(),
            srt_path: "a.srt".into(),
            duration_secs: 3.2,
            metadata: Value::Null,
        }));

        let got = mgr.get("TtsStep").expect("stored result");
        match got {
            StepResult::Tts(r) => assert_eq!(r.audio_path, "a.wav"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn missing_step_returns_none() {
        let mgr = ResultManager::new();
        assert!(mgr.get("UploadStep").is_none());
    }
}
