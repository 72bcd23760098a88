use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::{backend::QueueBackend, JobId, JobMessage, QueueCtx, QueueResult};

/// Retry/backoff knobs shared by the worker runtime when it computes
/// `retry_at` for `ack_fail` (spec.md §5 retry policy).
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub base_retry_backoff: Duration,
    pub max_retry_backoff: Duration,
    pub retry_jitter: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_retry_backoff: Duration::from_secs(1),
            max_retry_backoff: Duration::from_secs(3600),
            retry_jitter: true,
        }
    }
}

/// Thin façade over a [`QueueBackend`] used by producers (API handlers,
/// pipeline steps fanning out scene jobs) to enqueue work. The dequeue/ack
/// loop itself lives in `mg-worker`'s runtime, not here.
pub struct QueueAdapter<B: QueueBackend> {
    backend: Arc<B>,
    config: QueueConfig,
}

impl<B: QueueBackend + Send + Sync + 'static> QueueAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self { backend: Arc::new(backend), config: QueueConfig::default() }
    }

    pub fn with_config(backend: B, config: QueueConfig) -> Self {
        Self { backend: Arc::new(backend), config }
    }

    #[instrument(skip(self, message), fields(task_name = %message.task_name, queue = %message.queue))]
    pub async fn enqueue(&self, ctx: QueueCtx, message: JobMessage) -> QueueResult<JobId> {
        let job_id = self.backend.enqueue(ctx, message).await?;
        info!(%job_id, "enqueued job");
        Ok(job_id)
    }

    pub fn backend(&self) -> Arc<B> {
        self.backend.clone()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Exponential backoff with a hard ceiling; jitter is applied by the
    /// caller if `config.retry_jitter` is set, since only the worker knows
    /// the rng it wants to use.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.config.base_retry_backoff.as_secs().saturating_mul(1u64 << attempt.min(20));
        Duration::from_secs(exp.min(self.config.max_retry_backoff.as_secs()))
    }
}

impl<B: QueueBackend> Clone for QueueAdapter<B> {
    fn clone(&self) -> Self {
        Self { backend: self.backend.clone(), config: self.config.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[tokio::test]
    async fn test_adapter_enqueue() {
        let backend = MemoryBackend::new();
        let adapter = QueueAdapter::new(backend);

        let message = JobMessage::new("tts.synthesize", "default");
        let result = adapter.enqueue(QueueCtx::new(), message).await;
        assert!(result.is_ok());
    }

    #[test]
    fn backoff_caps_at_max() {
        let adapter = QueueAdapter::new(crate::backend::memory::MemoryBackend::new());
        assert!(adapter.backoff_for_attempt(30) <= adapter.config().max_retry_backoff);
    }
}
