use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::interval;
use tracing::{info, warn, debug};

use crate::{
    JobStatus,
    backend::memory::storage::MemoryBackend,
    QueueResult, JobEvent,
};

/// Lease expiry reaper for reclaiming jobs whose worker died mid-processing.
pub struct LeaseReaper {
    backend: Arc<MemoryBackend>,
    interval: Duration,
}

impl LeaseReaper {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        Self { backend, interval: Duration::from_secs(30) }
    }

    pub fn with_interval(backend: Arc<MemoryBackend>, interval: Duration) -> Self {
        Self { backend, interval }
    }

    pub async fn start(self) -> QueueResult<()> {
        let mut ticker = interval(self.interval);

        info!(interval_secs = self.interval.as_secs(), "starting lease reaper");

        loop {
            ticker.tick().await;

            match self.reap_expired_leases().await {
                Ok(0) => debug!("no expired leases found"),
                Ok(n) => info!(reclaimed = n, "reclaimed expired leases"),
                Err(e) => warn!(error = %e, "error during lease reaping"),
            }
        }
    }

    /// Runs one reaper cycle; returns the number of leases reclaimed.
    pub async fn reap_expired_leases(&self) -> QueueResult<usize> {
        let now = Utc::now();
        let mut reclaimed_count = 0;

        let expired_jobs = {
            let jobs = self.backend.jobs.read();
            jobs.iter()
                .filter_map(|(job_id, record)| match &record.status {
                    JobStatus::Processing { lease_until } if *lease_until < now => {
                        Some((job_id.clone(), record.clone()))
                    }
                    _ => None,
                })
                .collect::<Vec<_>>()
        };

        for (job_id, mut record) in expired_jobs {
            debug!(%job_id, "reclaiming expired lease");

            let new_status = if record.attempt > record.message.max_retries {
                record.dead_letter("lease expired, max retries exceeded".to_string());
                self.backend
                    .dead_letters
                    .write()
                    .entry(record.message.queue.clone())
                    .or_default()
                    .push(job_id.clone());
                record.status.clone()
            } else {
                record.schedule_retry(now);
                record.set_error("lease expired".to_string());
                record.status.clone()
            };

            self.backend.jobs.write().insert(job_id.clone(), record.clone());

            if matches!(new_status, JobStatus::Retrying { .. }) {
                let mut queues = self.backend.queues.write();
                let queue = queues.entry(record.message.queue.clone()).or_default();
                queue.push_back(job_id.clone());
            }

            let event = match new_status {
                JobStatus::Retrying { retry_at } => JobEvent::Retrying {
                    job_id: job_id.clone(),
                    retry_at,
                    error: "lease expired".to_string(),
                    at: now,
                },
                JobStatus::DeadLettered { error, .. } => {
                    JobEvent::DeadLettered { job_id: job_id.clone(), error, at: now }
                }
                _ => continue,
            };

            let _ = self.backend.event_broadcaster.send(event);
            reclaimed_count += 1;
        }

        Ok(reclaimed_count)
    }
}

/// Test helpers for deterministic lease-expiry testing.
impl MemoryBackend {
    pub async fn force_lease_expiry(&self, job_id: crate::JobId) -> QueueResult<()> {
        let mut jobs = self.jobs.write();
        if let Some(record) = jobs.get_mut(&job_id) {
            if let JobStatus::Processing { ref mut lease_until } = record.status {
                *lease_until = Utc::now() - chrono::Duration::seconds(1);
                record.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::QueueBackend;
    use crate::{JobMessage, QueueCtx};

    fn test_message() -> JobMessage {
        JobMessage::new("tts.synthesize", "default")
    }

    #[tokio::test]
    async fn test_lease_expiry_reaper() {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = QueueCtx::new();
        let message = test_message();

        let job_id = backend.enqueue(ctx.clone(), message).await.unwrap();
        let _leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();

        backend.force_lease_expiry(job_id.clone()).await.unwrap();

        let reaper = LeaseReaper::new(backend.clone());
        let reclaimed = reaper.reap_expired_leases().await.unwrap();

        assert_eq!(reclaimed, 1);

        let retry_leased = backend.dequeue(ctx, &["default"]).await.unwrap();
        assert!(retry_leased.is_some());
        assert_eq!(retry_leased.unwrap().record.attempt, 2);
    }

    #[tokio::test]
    async fn test_max_retries_exceeded_dead_letters() {
        let backend = Arc::new(MemoryBackend::new());
        let ctx = QueueCtx::new();
        let message = test_message().with_max_retries(0);

        let job_id = backend.enqueue(ctx.clone(), message).await.unwrap();
        let _leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();

        backend.force_lease_expiry(job_id.clone()).await.unwrap();

        let reaper = LeaseReaper::new(backend.clone());
        let reclaimed = reaper.reap_expired_leases().await.unwrap();
        assert_eq!(reclaimed, 1);

        let status = backend.get_status(ctx, job_id).await.unwrap();
        assert!(matches!(status, JobStatus::DeadLettered { .. }));
    }
}
