//! `JobExecutor` — loads one `Job`, builds its `PipelineContext`, and drives
//! the eight-step pipeline to completion against it (spec.md §4.6). Grounded
//! on `job_executor.py`'s `execute_job`: load job + catalog rows in one
//! pass, materialize a workspace directory, run the steps, persist the
//! terminal status. The transient-vs-permanent split on failure is read off
//! `PipelineError::is_retryable`, the same classification
//! `dog-queue::adapter::Worker::process_next_job` uses to decide ack vs.
//! nack.

use std::path::PathBuf;
use std::sync::Arc;

use mg_core::{ExecutionStatus, JobId};
use mg_pipeline::{PipelineContext, PipelineError, PipelineExecutor, PipelineStep, StepError, StepResult};
use mg_store::{Filter, Job, JobExecution, Query, StoreBackend, StoreError};
use serde_json::json;
use tracing::{info, instrument};

use crate::status::ArcStatusUpdater;

const EXECUTOR_STEP: &str = "JobExecutor";

/// Assembles and runs the fixed step order for one job. One instance is
/// shared (behind an `Arc`) by every worker task slot — it holds no
/// per-job state, only the wiring needed to build a context and run it.
pub struct JobExecutor {
    store: Arc<dyn StoreBackend>,
    steps: Vec<PipelineStep>,
    workspace_base: PathBuf,
}

impl JobExecutor {
    pub fn new(store: Arc<dyn StoreBackend>, steps: Vec<PipelineStep>, workspace_base: PathBuf) -> Self {
        Self { store, steps, workspace_base }
    }

    /// Runs one full attempt at `job_id` (spec.md §4.6 steps 1-6). Returns
    /// the finished, `SUCCESS`-transitioned execution on success; on
    /// failure, the `PipelineError` already carries the `is_retryable()`
    /// classification the caller needs to decide `ack_complete` vs.
    /// `ack_fail`.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn run_once(&self, job_id: JobId) -> Result<JobExecution, PipelineError> {
        let job = self.load_job(&job_id).await?;

        let language = self
            .store
            .get_language(&job.language_id)
            .await
            .map_err(|source| self.store_error(&job_id, source))?;
        let voice = self.store.get_voice(&job.voice_id).await.map_err(|source| self.store_error(&job_id, source))?;
        let topic = self.store.get_topic(&job.topic_id).await.map_err(|source| self.store_error(&job_id, source))?;
        // An account is optional context (logo, digital-human presenter, subtitle
        // color) — a missing row just means none of that applies, not a failure.
        let account = self.store.get_account(&job.account_id).await.ok();

        let workspace_dir = self.workspace_base.join(job.owner_id.no_dashes()).join(job.id.to_string());
        tokio::fs::create_dir_all(&workspace_dir)
            .await
            .map_err(|source| PipelineError::new(job_id.to_string(), StepError::Io { step_name: EXECUTOR_STEP, source }))?;

        let retry_count = self.attempt_number(&job_id).await?;
        let mut execution = JobExecution::new(job.id.clone());
        execution.retry_count = retry_count;
        execution.worker_hostname = Some(gethostname::gethostname().to_string_lossy().into_owned());
        let execution_id = execution.id.clone();
        let execution = self
            .store
            .create_execution(execution)
            .await
            .map_err(|source| self.store_error(&job_id, source))?;
        let mut execution = execution;

        let ctx = PipelineContext::from_job(&job, execution_id, &language, &voice, &topic, account.as_ref(), workspace_dir);
        let status_updater = ArcStatusUpdater(self.store.clone());

        let results = PipelineExecutor::run(&self.steps, &ctx, &mut execution, &status_updater).await?;

        if let Some(StepResult::Upload(upload)) = results.get("UploadStep") {
            execution.result_key = upload.urls.clone();
        }

        status_updater
            .update_execution_status(&mut execution, ExecutionStatus::Success, "pipeline completed".to_string())
            .await
            .map_err(|source| self.store_error(&job_id, source))?;

        info!(job_id = %job_id, execution_id = %execution.id, "job finished");
        Ok(execution)
    }

    async fn load_job(&self, job_id: &JobId) -> Result<Job, PipelineError> {
        let job = self.store.get_job(job_id).await.map_err(|source| self.store_error(job_id, source))?;
        if job.is_deleted() {
            return Err(PipelineError::new(
                job_id.to_string(),
                StepError::Other { step_name: EXECUTOR_STEP, message: "job has been soft-deleted".to_string() },
            ));
        }
        Ok(job)
    }

    /// Attempt ordinal for a fresh execution: the count of executions
    /// already recorded for this job. Zero on the first attempt, strictly
    /// increasing on every retry — trivially monotonic (spec.md §3).
    async fn attempt_number(&self, job_id: &JobId) -> Result<u32, PipelineError> {
        let query = Query::new().filter(Filter::Eq("job_id".to_string(), json!(job_id.to_string())));
        let page = self.store.list_executions(query).await.map_err(|source| self.store_error(job_id, source))?;
        Ok(page.total as u32)
    }

    fn store_error(&self, job_id: &JobId, source: StoreError) -> PipelineError {
        PipelineError::new(job_id.to_string(), StepError::Store { step_name: EXECUTOR_STEP, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_pipeline::PipelineBuilder;
    use mg_store::{Account, InMemoryStore, Language, Orientation, Topic, TopicExtras, User, Voice};
    use mg_core::UserId;
    use chrono::Utc;
    use serde_json::Value;

    fn seed_catalog(store: &InMemoryStore, owner: &UserId) {
        store.seed_language(Language { id: "lang".into(), owner_id: owner.clone(), name: "English".into(), code: "en".into(), deleted_at: None });
        store.seed_voice(Voice {
            id: "voice".into(),
            owner_id: owner.clone(),
            name: "v".into(),
            provider_voice_id: "zh-CN-XiaoqiuNeural".into(),
            language_id: "lang".into(),
            deleted_at: None,
        });
        store.seed_topic(Topic {
            id: "topic".into(),
            owner_id: owner.clone(),
            name: "t".into(),
            prompt_image_prefix: "prefix".into(),
            cover_prompt: None,
            style_adapter_list: vec![],
            extras: TopicExtras::default(),
            deleted_at: None,
        });
        store.seed_account(Account {
            id: "account".into(),
            owner_id: owner.clone(),
            name: "acct".into(),
            logo_location: None,
            digital_human_video_path: None,
            subtitle_color_name: None,
            deleted_at: None,
        });
    }

    struct DummyTtsStep;

    #[async_trait::async_trait]
    impl mg_pipeline::Step for DummyTtsStep {
        fn name(&self) -> &'static str {
            "DummyTtsStep"
        }

        async fn execute(&self, _ctx: &PipelineContext, _inputs: mg_pipeline::StepInputs) -> Result<StepResult, StepError> {
            Ok(StepResult::Tts(mg_pipeline::TtsResult {
                audio_path: "a.wav".into(),
                srt_path: "a.srt".into(),
                duration_secs: 1.0,
                metadata: Value::Null,
            }))
        }
    }

    #[tokio::test]
    async fn run_once_runs_steps_and_marks_success() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        seed_catalog(&store, &owner);

        let job = Job {
            id: JobId::new(),
            owner_id: owner,
            title: "t".into(),
            content: "c".into(),
            language_id: "lang".into(),
            voice_id: "voice".into(),
            topic_id: "topic".into(),
            account_id: "account".into(),
            speech_speed: 1.0,
            orientation: Orientation::Landscape,
            extras: Value::Null,
            run_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let job_id = job.id.clone();
        store.create_job(job).await.unwrap();

        let store: Arc<dyn StoreBackend> = Arc::new(store);
        let steps = PipelineBuilder::new().add_step(DummyTtsStep).build();
        let executor = JobExecutor::new(store, steps, std::env::temp_dir());

        let execution = executor.run_once(job_id).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Success);
        assert!(execution.worker_hostname.is_some());
    }

    #[tokio::test]
    async fn run_once_rejects_a_deleted_job() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        seed_catalog(&store, &owner);

        let mut job = Job {
            id: JobId::new(),
            owner_id: owner,
            title: "t".into(),
            content: "c".into(),
            language_id: "lang".into(),
            voice_id: "voice".into(),
            topic_id: "topic".into(),
            account_id: "account".into(),
            speech_speed: 1.0,
            orientation: Orientation::Landscape,
            extras: Value::Null,
            run_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        job.deleted_at = Some(Utc::now());
        let job_id = job.id.clone();
        store.create_job(job).await.unwrap();

        let store: Arc<dyn StoreBackend> = Arc::new(store);
        let executor = JobExecutor::new(store, PipelineBuilder::new().build(), std::env::temp_dir());

        let err = executor.run_once(job_id).await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
