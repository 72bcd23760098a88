//! Pipeline context: an immutable-ish snapshot of everything a job's steps
//! need to read but do not themselves own (spec.md §4.4). Grounded on
//! `PipelineContext.from_job` in `original_source/services/worker/pipeline/context.py`,
//! reduced to a plain value type since the functional pipeline mode (SPEC_FULL
//! §4.4 / spec.md §9) never mutates it — step outputs flow through
//! `StepResult`/`ResultManager` instead of being written back onto the context.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use mg_core::{ExecutionId, JobId, UserId};
use mg_store::{Account, Job, Orientation, StyleAdapter, Topic, TopicExtras, Voice};
use serde_json::Value;

/// Everything a step's `validate`/`execute` may read. Constructed once by
/// `mg-worker`'s job executor from the `Job` + catalog rows loaded in a
/// single transaction (spec.md §4.6 step 2), then shared by reference across
/// every step in the run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub job_id: JobId,
    pub execution_id: ExecutionId,
    pub user_id: UserId,
    pub workspace_dir: PathBuf,

    pub title: String,
    pub content: String,

    pub language_code: String,
    pub language_platform: String,
    pub voice_id: String,
    pub provider_voice_id: String,
    pub speech_speed: f32,
    pub orientation: Orientation,

    pub reference_audio_path: Option<String>,
    pub logo_path: Option<String>,
    pub topic_prompts: Option<Value>,
    pub prompt_image_prefix: String,
    pub style_adapter_list: Vec<StyleAdapter>,
    pub topic_extras: TopicExtras,
    pub account: Option<Account>,
    pub extras: Value,

    pub started_at: DateTime<Utc>,
}

impl PipelineContext {
    /// Build a context from the loaded `Job` plus its referenced catalog
    /// rows. `workspace_dir` is created by the caller
    /// (`base/{user_id_no_dashes}/{job_id}`, spec.md §4.6 step 2) before this
    /// is called.
    pub fn from_job(
        job: &Job,
        execution_id: ExecutionId,
        language: &mg_store::Language,
        voice: &Voice,
        topic: &Topic,
        account: Option<&Account>,
        workspace_dir: PathBuf,
    ) -> Self {
        Self {
            job_id: job.id.clone(),
            execution_id,
            user_id: job.owner_id.clone(),
            workspace_dir,
            title: job.title.clone(),
            content: job.content.clone(),
            language_code: language.code.clone(),
            language_platform: "edge".to_string(),
            voice_id: voice.id.clone(),
            provider_voice_id: voice.provider_voice_id.clone(),
            speech_speed: job.speech_speed,
            orientation: job.orientation,
            reference_audio_path: None,
            logo_path: account.and_then(|a| a.logo_location.clone()),
            topic_prompts: topic.cover_prompt.clone().map(Value::String),
            prompt_image_prefix: topic.prompt_image_prefix.clone(),
            style_adapter_list: topic.style_adapter_list.clone(),
            topic_extras: topic.extras.clone(),
            account: account.cloned(),
            extras: job.extras.clone(),
            started_at: Utc::now(),
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self.orientation, Orientation::Landscape)
    }

    /// `extras.enable_digital_human`, defaulting to `false` when the job's
    /// extras don't set it (grounded on `human_step.py`'s
    /// `context.extra.get("enable_digital_human", False)`).
    pub fn enable_digital_human(&self) -> bool {
        self.extras.get("enable_digital_human").and_then(Value::as_bool).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_store::Language;

    fn sample_job() -> Job {
        Job {
            id: JobId::new(),
            owner_id: UserId::new(),
            title: "title".into(),
            content: "content".into(),
            language_id: "lang".into(),
            voice_id: "voice".into(),
            topic_id: "topic".into(),
            account_id: "account".into(),
            speech_speed: 0.9,
            orientation: Orientation::Landscape,
            extras: Value::Null,
            run_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn from_job_copies_catalog_snapshot() {
        let job = sample_job();
        let language = Language { id: "lang".into(), owner_id: job.owner_id.clone(), name: "English".into(), code: "en".into(), deleted_at: None };
        let voice = Voice { id: "voice".into(), owner_id: job.owner_id.clone(), name: "v".into(), provider_voice_id: "zh-CN-XiaoqiuNeural".into(), language_id: "lang".into(), deleted_at: None };
        let topic = Topic {
            id: "topic".into(),
            owner_id: job.owner_id.clone(),
            name: "t".into(),
            prompt_image_prefix: "prefix".into(),
            cover_prompt: Some("a cover".into()),
            style_adapter_list: vec![StyleAdapter { name: "anime".into(), weight: 0.8 }],
            extras: Default::default(),
            deleted_at: None,
        };

        let ctx = PipelineContext::from_job(&job, ExecutionId::new(), &language, &voice, &topic, None, PathBuf::from("/tmp/job"));

        assert_eq!(ctx.provider_voice_id, "zh-CN-XiaoqiuNeural");
        assert_eq!(ctx.style_adapter_list.len(), 1);
        assert!(ctx.is_horizontal());
        assert!(!ctx.enable_digital_human());
    }
}
