//! `WorkerRuntime` — the long-lived dequeue/dispatch/ack loop (spec.md
//! §4.7). Grounded on `dog-queue::adapter::QueueAdapter::start_workers` /
//! `Worker::run`'s bounded-pool shape, generalized from dog-queue's
//! type-registered jobs to this engine's fixed, named-task dispatch table:
//! `process_video_job`, `generate_single_image_task`, and the three
//! maintenance tasks the scheduler fires.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mg_core::{AppConfig, JobId as CoreJobId};
use mg_queue::{LeasedJob, QueueBackend, QueueCtx};
use mg_core::ExecutionStatus;
use mg_store::{Filter, Query, StoreBackend};
use rand::Rng;
use serde_json::json;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{error, info, instrument, warn};

use crate::error::FatalSystemError;
use crate::executor::JobExecutor;
use crate::health::{HealthProbe, HealthReport};

const PROCESS_VIDEO_JOB: &str = "process_video_job";
const GENERATE_SINGLE_IMAGE_TASK: &str = "generate_single_image_task";
const RESET_STUCK_JOBS: &str = "reset_stuck_jobs";
const CLEANUP_OLD_JOBS: &str = "cleanup_old_jobs";
const CHECK_JOB_HEALTH: &str = "check_job_health";

/// Retention window for `cleanup_old_jobs`: jobs created more than this long
/// ago are soft-deleted regardless of status (SPEC_FULL §9 Open Questions —
/// the source's own retention constant wasn't in the retrieved slice, so
/// 30 days is a conservative, documented default).
const OLD_JOB_RETENTION_DAYS: i64 = 30;

/// What a dispatched task decided should happen to the queue message that
/// carried it.
enum TaskOutcome {
    Complete(Option<String>),
    Retry { error: String },
    Fail { error: String },
}

pub struct WorkerRuntime {
    store: Arc<dyn StoreBackend>,
    queue: Arc<dyn QueueBackend>,
    executor: Arc<JobExecutor>,
    queues: Vec<String>,
    concurrency: usize,
    soft_timeout: Duration,
    hard_timeout: Duration,
    stuck_threshold: Duration,
    max_retries: u32,
    base_retry_backoff: Duration,
    max_retry_backoff: Duration,
    retry_jitter: bool,
    active_tasks: AtomicUsize,
}

impl WorkerRuntime {
    pub fn new(store: Arc<dyn StoreBackend>, queue: Arc<dyn QueueBackend>, executor: Arc<JobExecutor>, config: &AppConfig) -> Self {
        Self {
            store,
            queue,
            executor,
            queues: vec!["video_processing".to_string(), "maintenance".to_string()],
            concurrency: config.worker_concurrency.max(1),
            soft_timeout: Duration::from_secs(config.soft_timeout_secs),
            hard_timeout: Duration::from_secs(config.hard_timeout_secs),
            stuck_threshold: Duration::from_secs(config.stuck_threshold_secs),
            max_retries: config.max_retries,
            base_retry_backoff: Duration::from_secs(config.base_retry_backoff_secs),
            max_retry_backoff: Duration::from_secs(config.max_retry_backoff_secs),
            retry_jitter: config.retry_jitter,
            active_tasks: AtomicUsize::new(0),
        }
    }

    /// Runs `concurrency` dequeue loops concurrently. Never returns under
    /// normal operation; each slot restarts its own loop on an unexpected
    /// backend error rather than bringing the whole runtime down.
    pub async fn run(self: Arc<Self>) {
        let mut slots = JoinSet::new();
        for slot in 0..self.concurrency {
            let runtime = self.clone();
            slots.spawn(async move { runtime.worker_loop(slot).await });
        }
        while slots.join_next().await.is_some() {}
    }

    #[instrument(skip(self), fields(slot))]
    async fn worker_loop(self: Arc<Self>, slot: usize) {
        let queue_refs: Vec<&str> = self.queues.iter().map(String::as_str).collect();
        loop {
            match self.queue.dequeue(QueueCtx::new(), &queue_refs).await {
                Ok(Some(leased)) => {
                    self.active_tasks.fetch_add(1, Ordering::SeqCst);
                    self.handle(leased).await;
                    self.active_tasks.fetch_sub(1, Ordering::SeqCst);
                }
                Ok(None) => sleep(Duration::from_millis(500)).await,
                Err(e) => {
                    warn!(slot, error = %e, "dequeue failed, backing off");
                    sleep(Duration::from_secs(2)).await;
                }
            }
        }
    }

    async fn handle(&self, leased: LeasedJob) {
        let task_name = leased.message().task_name.clone();
        let job_id = leased.job_id().clone();
        let lease_token = leased.lease_token.clone();
        let attempt = leased.record.attempt;

        let outcome = match task_name.as_str() {
            PROCESS_VIDEO_JOB => self.run_process_video_job(&leased).await,
            GENERATE_SINGLE_IMAGE_TASK => self.run_generate_single_image_task(&leased).await,
            RESET_STUCK_JOBS => self.run_reset_stuck_jobs().await,
            CLEANUP_OLD_JOBS => self.run_cleanup_old_jobs().await,
            CHECK_JOB_HEALTH => self.run_check_job_health().await,
            other => Ok(TaskOutcome::Fail { error: format!("unrecognized task '{other}'") }),
        };

        let ctx = QueueCtx::new();
        let result = match outcome {
            Ok(TaskOutcome::Complete(result_ref)) => self.queue.ack_complete(ctx, job_id, lease_token, result_ref).await,
            Ok(TaskOutcome::Retry { error }) => {
                let retry_at = self.retry_at(attempt);
                self.queue.ack_fail(ctx, job_id, lease_token, error, retry_at).await
            }
            Ok(TaskOutcome::Fail { error }) => self.queue.ack_fail(ctx, job_id, lease_token, error, None).await,
            Err(fatal) => {
                error!(task = task_name, error = %fatal, "task dispatch failed fatally");
                self.queue.ack_fail(ctx, job_id, lease_token, fatal.to_string(), None).await
            }
        };

        if let Err(e) = result {
            error!(task = task_name, error = %e, "failed to ack queue message");
        }
    }

    async fn run_process_video_job(&self, leased: &LeasedJob) -> Result<TaskOutcome, FatalSystemError> {
        let job_id_str = leased
            .message()
            .args
            .get("job_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FatalSystemError::UnknownTask("process_video_job: missing 'job_id' arg".to_string()))?;
        let job_id = CoreJobId::from_string(job_id_str.to_string());

        let run = self.executor.run_once(job_id.clone());
        tokio::pin!(run);

        let result = tokio::select! {
            res = &mut run => res,
            _ = sleep(self.soft_timeout) => {
                warn!(job_id = %job_id, "soft time limit exceeded, continuing until hard limit");
                let remaining = self.hard_timeout.saturating_sub(self.soft_timeout);
                match timeout(remaining, &mut run).await {
                    Ok(res) => res,
                    Err(_) => return Ok(TaskOutcome::Retry { error: "hard time limit exceeded".to_string() }),
                }
            }
        };

        match result {
            Ok(execution) => Ok(TaskOutcome::Complete(execution.result_key.get("video_oss_key").cloned())),
            Err(pipeline_err) if pipeline_err.is_retryable() => Ok(TaskOutcome::Retry { error: pipeline_err.to_string() }),
            Err(pipeline_err) => Ok(TaskOutcome::Fail { error: pipeline_err.to_string() }),
        }
    }

    /// `ImageStep` already fans scene generation out in-process via a
    /// `JoinSet` (`mg-steps::image`), so this task has no work to do today —
    /// it exists so a message under this name dispatches cleanly rather
    /// than dead-lettering, in case a future distributed image-generation
    /// mode re-introduces it as a standalone unit of work.
    async fn run_generate_single_image_task(&self, _leased: &LeasedJob) -> Result<TaskOutcome, FatalSystemError> {
        warn!("generate_single_image_task dispatched but has no standalone handler; acking as a no-op");
        Ok(TaskOutcome::Complete(None))
    }

    /// `cleanup-stuck-jobs-every-3-minutes`: executions left `RUNNING` with no
    /// heartbeat (`updated_at`) past the stuck threshold are a worker that
    /// died mid-job, not a job that's still making progress — mark them
    /// `TIMEOUT` so the next client poll sees a terminal state instead of
    /// hanging forever. Distinct from `soft_timeout`/`hard_timeout`, which
    /// bound a single task's own in-process run; this is the maintenance
    /// sweep's independent heartbeat check over `updated_at`.
    async fn run_reset_stuck_jobs(&self) -> Result<TaskOutcome, FatalSystemError> {
        let query = Query::new().filter(Filter::Eq("status".to_string(), json!("Running")));
        let page = self.store.list_executions(query).await.map_err(FatalSystemError::from)?;

        let cutoff = Utc::now() - chrono::Duration::seconds(self.stuck_threshold.as_secs() as i64);
        let mut reset = 0u32;
        for mut execution in page.items {
            if execution.updated_at >= cutoff {
                continue;
            }
            if execution.transition(ExecutionStatus::Timeout, "stuck > threshold".to_string()).is_ok() {
                if self.store.update_execution(execution).await.is_ok() {
                    reset += 1;
                }
            }
        }
        info!(reset, "cleanup-stuck-jobs sweep complete");
        Ok(TaskOutcome::Complete(None))
    }

    /// `cleanup-old-jobs-daily`: soft-deletes jobs past the retention
    /// window so the store doesn't grow unbounded.
    async fn run_cleanup_old_jobs(&self) -> Result<TaskOutcome, FatalSystemError> {
        let cutoff = Utc::now() - chrono::Duration::days(OLD_JOB_RETENTION_DAYS);
        // Filtered in memory rather than via `Filter::Lt("created_at", ..)`:
        // the in-memory backend's comparator is numeric-only and a
        // `DateTime<Utc>` serializes to an RFC3339 string, so a store-level
        // date range filter would silently match nothing.
        let page = self.store.list_jobs(Query::new()).await.map_err(FatalSystemError::from)?;

        let mut deleted = 0u32;
        for job in page.items.into_iter().filter(|job| job.created_at < cutoff) {
            if self.store.soft_delete_job(&job.id).await.is_ok() {
                deleted += 1;
            }
        }
        info!(deleted, retention_days = OLD_JOB_RETENTION_DAYS, "cleanup-old-jobs sweep complete");
        Ok(TaskOutcome::Complete(None))
    }

    /// `check-job-health-hourly`: a read-only census, logged for whatever
    /// scrapes worker logs today; no dedicated metrics pipeline exists in
    /// this workspace (SPEC_FULL's ambient stack stops at `tracing`).
    async fn run_check_job_health(&self) -> Result<TaskOutcome, FatalSystemError> {
        let running = self.store.list_executions(Query::new().filter(Filter::Eq("status".to_string(), json!("Running")))).await.map_err(FatalSystemError::from)?;
        let failed = self.store.list_executions(Query::new().filter(Filter::Eq("status".to_string(), json!("Failed")))).await.map_err(FatalSystemError::from)?;
        info!(running = running.total, failed = failed.total, "job health check");
        Ok(TaskOutcome::Complete(None))
    }

    /// Exponential backoff capped at `max_retry_backoff`, with optional
    /// full jitter (spec.md §5 — mirrors `CELERY_TASK_RETRY_JITTER`).
    /// `None` once `max_retries` attempts have already been made, telling
    /// the caller to dead-letter rather than schedule another attempt.
    fn retry_at(&self, attempt: u32) -> Option<chrono::DateTime<Utc>> {
        if attempt + 1 >= self.max_retries {
            return None;
        }
        let exp = self.base_retry_backoff.as_secs().saturating_mul(1u64 << attempt.min(20));
        let capped = exp.min(self.max_retry_backoff.as_secs()).max(1);
        let secs = if self.retry_jitter { rand::thread_rng().gen_range(0..=capped) } else { capped };
        Some(Utc::now() + chrono::Duration::seconds(secs as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_core::RawConfig;
    use mg_pipeline::PipelineBuilder;
    use mg_queue::backend::memory::MemoryBackend;
    use mg_store::{InMemoryStore, Job, JobExecution, Orientation};

    fn config() -> AppConfig {
        let mut raw = RawConfig::new();
        raw.set("db_dsn", "mem://test");
        raw.set("broker_url", "mem://test");
        raw.set("jwt_secret", "a".repeat(32));
        raw.set("stuck_threshold_secs", "900");
        AppConfig::load(&raw).unwrap()
    }

    fn runtime(store: Arc<dyn StoreBackend>) -> WorkerRuntime {
        let queue: Arc<dyn QueueBackend> = Arc::new(MemoryBackend::new());
        let executor = Arc::new(JobExecutor::new(store.clone(), PipelineBuilder::new().build(), std::env::temp_dir()));
        WorkerRuntime::new(store, queue, executor, &config())
    }

    #[tokio::test]
    async fn reset_stuck_jobs_times_out_a_stale_heartbeat() {
        let store: Arc<dyn StoreBackend> = Arc::new(InMemoryStore::new());
        let owner = mg_core::UserId::new();
        let job = Job {
            id: CoreJobId::new(),
            owner_id: owner,
            title: "t".into(),
            content: "c".into(),
            language_id: "lang".into(),
            voice_id: "voice".into(),
            topic_id: "topic".into(),
            account_id: "account".into(),
            speech_speed: 1.0,
            orientation: Orientation::Landscape,
            extras: serde_json::Value::Null,
            run_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        store.create_job(job.clone()).await.unwrap();

        let mut execution = JobExecution::new(job.id.clone());
        execution.transition(ExecutionStatus::Running, "started").unwrap();
        execution.updated_at = Utc::now() - chrono::Duration::minutes(30);
        store.create_execution(execution.clone()).await.unwrap();

        let runtime = runtime(store.clone());
        runtime.run_reset_stuck_jobs().await.unwrap();

        let reloaded = store.get_execution(&execution.id).await.unwrap();
        assert_eq!(reloaded.status, ExecutionStatus::Timeout);
        assert!(reloaded.finished_at.is_some());
    }

    #[tokio::test]
    async fn reset_stuck_jobs_leaves_a_recent_heartbeat_running() {
        let store: Arc<dyn StoreBackend> = Arc::new(InMemoryStore::new());
        let owner = mg_core::UserId::new();
        let job = Job {
            id: CoreJobId::new(),
            owner_id: owner,
            title: "t".into(),
            content: "c".into(),
            language_id: "lang".into(),
            voice_id: "voice".into(),
            topic_id: "topic".into(),
            account_id: "account".into(),
            speech_speed: 1.0,
            orientation: Orientation::Landscape,
            extras: serde_json::Value::Null,
            run_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        store.create_job(job.clone()).await.unwrap();

        let mut execution = JobExecution::new(job.id.clone());
        execution.transition(ExecutionStatus::Running, "started").unwrap();
        store.create_execution(execution.clone()).await.unwrap();

        let runtime = runtime(store.clone());
        runtime.run_reset_stuck_jobs().await.unwrap();

        let reloaded = store.get_execution(&execution.id).await.unwrap();
        assert_eq!(reloaded.status, ExecutionStatus::Running);
    }
}

#[async_trait::async_trait]
impl HealthProbe for WorkerRuntime {
    async fn live(&self) -> bool {
        true
    }

    async fn extended(&self) -> HealthReport {
        let store_reachable = self.store.list_jobs(Query::new()).await.is_ok();
        // No backend swapped in today exposes an async ping; dequeue/ack
        // already surfacing `QueueError` on every loop iteration is the
        // real signal, so readiness just reflects the store round-trip.
        let queue_reachable = true;
        HealthReport {
            store_reachable,
            queue_reachable,
            active_tasks: self.active_tasks.load(Ordering::SeqCst),
            capacity: self.concurrency,
        }
    }
}
