pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_core::Stream;
use std::pin::Pin;
use std::time::Duration;

use crate::{JobEvent, JobId, JobMessage, JobRecord, JobStatus, LeasedJob, QueueCapabilities, QueueCtx, QueueResult, types::LeaseToken};

/// Type alias for boxed streams (stable Rust compatible).
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send + 'static>>;

/// Backend trait for queue storage primitives (spec.md §4.2).
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Enqueue a job with scoped idempotency.
    async fn enqueue(&self, ctx: QueueCtx, message: JobMessage) -> QueueResult<JobId>;

    /// Lease-based dequeue across one or more queues, in the order given.
    /// Returns the first eligible item (`run_at <= now`, not terminal).
    async fn dequeue(&self, ctx: QueueCtx, queues: &[&str]) -> QueueResult<Option<LeasedJob>>;

    /// Acknowledge job completion (cancel-wins, lease token required).
    async fn ack_complete(&self, ctx: QueueCtx, job_id: JobId, lease_token: LeaseToken, result_ref: Option<String>) -> QueueResult<()>;

    /// Acknowledge job failure. `retry_at` is computed by the caller's
    /// backoff policy; `None` means "do not retry, fail/dead-letter now".
    async fn ack_fail(
        &self,
        ctx: QueueCtx,
        job_id: JobId,
        lease_token: LeaseToken,
        error: String,
        retry_at: Option<DateTime<Utc>>,
    ) -> QueueResult<()>;

    async fn heartbeat_extend(&self, ctx: QueueCtx, job_id: JobId, lease_token: LeaseToken, extra_time: Duration) -> QueueResult<()>;

    /// Cancel a job (cancel-wins semantics).
    async fn cancel(&self, ctx: QueueCtx, job_id: JobId) -> QueueResult<bool>;

    async fn get_status(&self, ctx: QueueCtx, job_id: JobId) -> QueueResult<JobStatus>;

    async fn get_record(&self, ctx: QueueCtx, job_id: JobId) -> QueueResult<JobRecord>;

    /// Dead-letter stream contents (spec.md §4.2), newest first.
    async fn dead_letter(&self, ctx: QueueCtx, queue: &str) -> QueueResult<Vec<JobRecord>>;

    fn event_stream(&self, ctx: QueueCtx) -> BoxStream<JobEvent>;

    fn capabilities(&self) -> QueueCapabilities;
}
