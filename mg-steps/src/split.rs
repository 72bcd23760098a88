//! `SplitStep`: groups subtitle cues into scenes bounded by a max duration
//! and a CJK-aware text budget, grounded on `split_step.py`'s
//! `TextSplittingStep._create_splits`.

use async_trait::async_trait;
use mg_core::SplitId;
use mg_pipeline::{PipelineContext, SplitResult, Step, StepError, StepInputs, StepResult, ValidationError};
use mg_store::JobSplit;
use serde::Serialize;
use serde_json::json;

use crate::srt::{parse_srt, weighted_len, SrtCue};

/// Wire shape for `workspace/splits.json` (spec.md §6 "Scene split file"):
/// `{"splits": [{"index", "start", "end", "text", "prompt"}, ...]}`. Kept
/// distinct from `JobSplit` — the store entity carries fields (`job_id`,
/// `image_candidates`, ...) that aren't part of this external artifact's
/// documented schema.
#[derive(Serialize)]
struct SplitsFile<'a> {
    splits: Vec<SplitFileEntry<'a>>,
}

#[derive(Serialize)]
struct SplitFileEntry<'a> {
    index: u32,
    start: u64,
    end: u64,
    text: &'a str,
    prompt: &'a str,
}

impl<'a> From<&'a JobSplit> for SplitFileEntry<'a> {
    fn from(split: &'a JobSplit) -> Self {
        Self { index: split.index, start: split.start_ms, end: split.end_ms, text: &split.text, prompt: &split.prompt }
    }
}

/// `TextProcessingConfig.MAX_SPLIT_TEXT_LENGTH` — a scene's accumulated text
/// can't exceed this weighted length (CJK codepoints count double).
const MAX_SPLIT_TEXT_LENGTH: usize = 100;

pub struct SplitStep;

impl SplitStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SplitStep {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitStep {
    fn build_splits(cues: &[SrtCue], max_duration_secs: f32, prompt_prefix: &str) -> Vec<JobSplit> {
        let max_duration_ms = (max_duration_secs * 1000.0) as u64;
        let mut splits = Vec::new();
        let mut current_text = String::new();
        let mut current_start_ms: Option<u64> = None;
        let mut current_end_ms = 0u64;

        for cue in cues {
            if current_start_ms.is_none() {
                current_start_ms = Some(cue.start_ms);
            }

            let candidate = format!("{current_text}{}", cue.text);
            let duration_ms = cue.end_ms.saturating_sub(current_start_ms.unwrap_or(cue.start_ms));

            if duration_ms >= max_duration_ms || weighted_len(&candidate) > MAX_SPLIT_TEXT_LENGTH {
                if !current_text.is_empty() {
                    splits.push(Self::finish_split(splits.len() as u32, current_start_ms.unwrap_or(cue.start_ms), current_end_ms, &current_text, prompt_prefix));
                }
                current_text = cue.text.clone();
                current_start_ms = Some(cue.start_ms);
            } else {
                current_text = candidate;
            }
            current_end_ms = cue.end_ms;
        }

        if !current_text.is_empty() {
            splits.push(Self::finish_split(splits.len() as u32, current_start_ms.unwrap_or(0), current_end_ms, &current_text, prompt_prefix));
        }

        splits
    }

    fn finish_split(index: u32, start_ms: u64, end_ms: u64, text: &str, prompt_prefix: &str) -> JobSplit {
        let prompt = format!("{prompt_prefix} {text}").trim().to_string();
        JobSplit {
            id: SplitId::new(),
            job_id: Default::default(),
            index,
            start_ms,
            end_ms,
            text: text.to_string(),
            prompt,
            image_candidates: Vec::new(),
            selected_image_id: None,
            video_path: None,
        }
    }
}

#[async_trait]
impl Step for SplitStep {
    fn name(&self) -> &'static str {
        "SplitStep"
    }

    fn description(&self) -> &'static str {
        "Group subtitle cues into scenes bounded by a max duration and text budget"
    }

    fn validate(&self, _ctx: &PipelineContext, inputs: &StepInputs) -> Result<(), ValidationError> {
        inputs.require_srt_path(self.name())?;
        Ok(())
    }

    async fn execute(&self, ctx: &PipelineContext, inputs: StepInputs) -> Result<StepResult, StepError> {
        let srt_path = inputs.require_srt_path(self.name()).map_err(|source| StepError::Validation { step_name: self.name(), source })?;

        let content = tokio::fs::read_to_string(srt_path).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;
        let cues = parse_srt(&content);

        if cues.is_empty() {
            return Err(StepError::Other { step_name: self.name(), message: "subtitle file contained no cues to split".to_string() });
        }

        let mut splits = Self::build_splits(&cues, ctx.topic_extras.scene_duration_seconds, &ctx.prompt_image_prefix);
        for split in &mut splits {
            split.job_id = ctx.job_id.clone();
        }

        let splits_file = SplitsFile { splits: splits.iter().map(SplitFileEntry::from).collect() };
        let splits_json = serde_json::to_string_pretty(&splits_file).map_err(|e| StepError::Other { step_name: self.name(), message: e.to_string() })?;
        let splits_path = ctx.workspace_dir.join("splits.json");
        tokio::fs::write(&splits_path, splits_json).await.map_err(|source| StepError::Io { step_name: self.name(), source })?;

        Ok(StepResult::Split(SplitResult {
            metadata: json!({ "scene_count": splits.len() }),
            splits,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_file_matches_the_documented_wire_schema() {
        let split = JobSplit {
            id: SplitId::new(),
            job_id: Default::default(),
            index: 0,
            start_ms: 0,
            end_ms: 4800,
            text: "hello".into(),
            prompt: "a prompt".into(),
            image_candidates: Vec::new(),
            selected_image_id: None,
            video_path: None,
        };

        let file = SplitsFile { splits: vec![SplitFileEntry::from(&split)] };
        let value: serde_json::Value = serde_json::to_value(&file).unwrap();

        assert!(value.get("splits").is_some());
        let entry = &value["splits"][0];
        assert_eq!(entry["index"], 0);
        assert_eq!(entry["start"], 0);
        assert_eq!(entry["end"], 4800);
        assert_eq!(entry["text"], "hello");
        assert_eq!(entry["prompt"], "a prompt");
        assert!(entry.get("start_ms").is_none());
        assert!(entry.get("job_id").is_none());
    }
}
