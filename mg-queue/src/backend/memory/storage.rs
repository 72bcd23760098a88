use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::{
    QueueResult, QueueError, QueueCtx, JobId, JobMessage, JobRecord,
    JobStatus, LeasedJob, QueueCapabilities, JobEvent, backend::{QueueBackend, BoxStream},
    types::LeaseToken,
};

type Queues = HashMap<String, VecDeque<JobId>>;
type IdempotencyMap = HashMap<String, JobId>;

/// In-memory backend for testing and development.
pub struct MemoryBackend {
    pub(crate) jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
    pub(crate) queues: Arc<RwLock<Queues>>,
    pub(crate) idempotency: Arc<RwLock<IdempotencyMap>>,
    pub(crate) dead_letters: Arc<RwLock<HashMap<String, Vec<JobId>>>>,
    pub(crate) event_broadcaster: broadcast::Sender<JobEvent>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (event_broadcaster, _) = broadcast::channel(1000);

        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            queues: Arc::new(RwLock::new(HashMap::new())),
            idempotency: Arc::new(RwLock::new(HashMap::new())),
            dead_letters: Arc::new(RwLock::new(HashMap::new())),
            event_broadcaster,
        }
    }
}

#[async_trait]
impl QueueBackend for MemoryBackend {
    async fn enqueue(&self, _ctx: QueueCtx, message: JobMessage) -> QueueResult<JobId> {
        if let Some(ref key) = message.idempotency_key {
            let scope = QueueCtx::scoped_idempotency_key(&message.queue, &message.task_name, key);

            let idempotency = self.idempotency.read();
            if let Some(existing_job_id) = idempotency.get(&scope) {
                let jobs = self.jobs.read();
                if let Some(existing_record) = jobs.get(existing_job_id) {
                    if !existing_record.status.is_terminal() {
                        return Ok(existing_job_id.clone());
                    }
                }
            }
        }

        let job_id = JobId::new();
        let now = Utc::now();

        let record = JobRecord::new(job_id.clone(), message.clone());
        self.jobs.write().insert(job_id.clone(), record);

        let mut queues = self.queues.write();
        let queue = queues.entry(message.queue.clone()).or_default();

        let insert_pos = {
            let jobs = self.jobs.read();
            queue
                .iter()
                .position(|existing_job_id| {
                    if let Some(existing_record) = jobs.get(existing_job_id) {
                        match message.priority.cmp(&existing_record.message.priority) {
                            std::cmp::Ordering::Greater => true,
                            std::cmp::Ordering::Less => false,
                            std::cmp::Ordering::Equal => now < existing_record.created_at,
                        }
                    } else {
                        true
                    }
                })
                .unwrap_or(queue.len())
        };

        queue.insert(insert_pos, job_id.clone());

        if let Some(ref key) = message.idempotency_key {
            let scope = QueueCtx::scoped_idempotency_key(&message.queue, &message.task_name, key);
            self.idempotency.write().insert(scope, job_id.clone());
        }

        let event = JobEvent::Enqueued {
            job_id: job_id.clone(),
            queue: message.queue.clone(),
            task_name: message.task_name.clone(),
            at: now,
        };
        let _ = self.event_broadcaster.send(event);

        Ok(job_id)
    }

    async fn dequeue(&self, _ctx: QueueCtx, queues: &[&str]) -> QueueResult<Option<LeasedJob>> {
        let now = Utc::now();

        for queue_name in queues {
            loop {
                let candidate_id = {
                    let mut queues_lock = self.queues.write();
                    let Some(queue) = queues_lock.get_mut(*queue_name) else {
                        break;
                    };

                    let jobs = self.jobs.read();
                    let index = queue.iter().position(|job_id| {
                        jobs.get(job_id).map(|r| r.status.is_eligible(now)).unwrap_or(true)
                    });
                    drop(jobs);

                    match index {
                        Some(i) => queue.remove(i),
                        None => break,
                    }
                };

                let Some(job_id) = candidate_id else { break };

                let mut jobs = self.jobs.write();
                let Some(record) = jobs.get_mut(&job_id) else { continue };

                if !record.status.is_eligible(now) {
                    continue;
                }

                let lease_token = LeaseToken::new();
                let lease_until = now + chrono::Duration::seconds(300);
                record.attempt += 1;
                record.start_processing(lease_token.clone(), lease_until);

                let event = JobEvent::Leased { job_id: job_id.clone(), lease_until, at: now };
                let _ = self.event_broadcaster.send(event);

                return Ok(Some(LeasedJob { record: record.clone(), lease_token, lease_until }));
            }
        }

        Ok(None)
    }

    async fn ack_complete(
        &self,
        _ctx: QueueCtx,
        job_id: JobId,
        lease_token: LeaseToken,
        _result_ref: Option<String>,
    ) -> QueueResult<()> {
        let now = Utc::now();
        let mut jobs = self.jobs.write();

        let record = jobs.get_mut(&job_id).ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;

        if matches!(record.status, JobStatus::Canceled { .. }) {
            return Err(QueueError::JobCanceled);
        }
        if record.status.is_terminal() {
            return Err(QueueError::JobAlreadyTerminal);
        }
        if record.lease_token.as_ref() != Some(&lease_token) {
            return Err(QueueError::InvalidLeaseToken);
        }
        if let Some(lease_until) = record.lease_until {
            if now > lease_until {
                return Err(QueueError::LeaseExpired);
            }
        }

        record.complete();

        let event = JobEvent::Completed { job_id: job_id.clone(), at: now };
        let _ = self.event_broadcaster.send(event);

        Ok(())
    }

    async fn ack_fail(
        &self,
        _ctx: QueueCtx,
        job_id: JobId,
        lease_token: LeaseToken,
        error: String,
        retry_at: Option<chrono::DateTime<Utc>>,
    ) -> QueueResult<()> {
        let now = Utc::now();
        let mut jobs = self.jobs.write();

        let record = jobs.get_mut(&job_id).ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;

        if matches!(record.status, JobStatus::Canceled { .. }) {
            return Err(QueueError::JobCanceled);
        }
        if record.status.is_terminal() {
            return Err(QueueError::JobAlreadyTerminal);
        }
        if record.lease_token.as_ref() != Some(&lease_token) {
            return Err(QueueError::InvalidLeaseToken);
        }
        if let Some(lease_until) = record.lease_until {
            if now > lease_until {
                return Err(QueueError::LeaseExpired);
            }
        }

        if record.attempt > record.message.max_retries {
            let dead_error = format!("max retries exceeded: {error}");
            record.dead_letter(dead_error.clone());
            self.dead_letters.write().entry(record.message.queue.clone()).or_default().push(job_id.clone());

            let event = JobEvent::DeadLettered { job_id: job_id.clone(), error: dead_error, at: now };
            let _ = self.event_broadcaster.send(event);
        } else if let Some(retry_time) = retry_at {
            record.schedule_retry(retry_time);
            record.set_error(error.clone());

            let mut queues = self.queues.write();
            let queue = queues.entry(record.message.queue.clone()).or_default();
            queue.push_back(job_id.clone());

            let event = JobEvent::Retrying { job_id: job_id.clone(), retry_at: retry_time, error, at: now };
            let _ = self.event_broadcaster.send(event);
        } else {
            record.fail(error.clone());

            let event = JobEvent::Failed { job_id: job_id.clone(), error, at: now };
            let _ = self.event_broadcaster.send(event);
        }

        Ok(())
    }

    async fn heartbeat_extend(
        &self,
        _ctx: QueueCtx,
        job_id: JobId,
        lease_token: LeaseToken,
        extra_time: std::time::Duration,
    ) -> QueueResult<()> {
        let now = Utc::now();
        let mut jobs = self.jobs.write();

        let record = jobs.get_mut(&job_id).ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;

        if matches!(record.status, JobStatus::Canceled { .. }) {
            return Err(QueueError::JobCanceled);
        }
        if record.lease_token.as_ref() != Some(&lease_token) {
            return Err(QueueError::InvalidLeaseToken);
        }

        if let Some(ref mut lease_until) = record.lease_until {
            *lease_until += chrono::Duration::from_std(extra_time).unwrap_or_default();
            record.updated_at = now;
        }

        Ok(())
    }

    async fn cancel(&self, _ctx: QueueCtx, job_id: JobId) -> QueueResult<bool> {
        let now = Utc::now();
        let mut jobs = self.jobs.write();

        let record = jobs.get_mut(&job_id).ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;

        if record.status.is_terminal() {
            return Ok(false);
        }

        record.cancel();

        let event = JobEvent::Canceled { job_id: job_id.clone(), at: now };
        let _ = self.event_broadcaster.send(event);

        Ok(true)
    }

    async fn get_status(&self, _ctx: QueueCtx, job_id: JobId) -> QueueResult<JobStatus> {
        let jobs = self.jobs.read();
        let record = jobs.get(&job_id).ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;
        Ok(record.status.clone())
    }

    async fn get_record(&self, _ctx: QueueCtx, job_id: JobId) -> QueueResult<JobRecord> {
        let jobs = self.jobs.read();
        let record = jobs.get(&job_id).ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;
        Ok(record.clone())
    }

    async fn dead_letter(&self, _ctx: QueueCtx, queue: &str) -> QueueResult<Vec<JobRecord>> {
        let dead_letters = self.dead_letters.read();
        let Some(ids) = dead_letters.get(queue) else { return Ok(Vec::new()) };

        let jobs = self.jobs.read();
        let mut records: Vec<JobRecord> = ids.iter().filter_map(|id| jobs.get(id).cloned()).collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    fn event_stream(&self, _ctx: QueueCtx) -> BoxStream<JobEvent> {
        let receiver = self.event_broadcaster.subscribe();
        use tokio_stream::{wrappers::BroadcastStream, StreamExt};
        let stream = BroadcastStream::new(receiver).filter_map(|result| result.ok());

        Box::pin(stream)
    }

    fn capabilities(&self) -> QueueCapabilities {
        QueueCapabilities::all()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryBackend {
    fn clone(&self) -> Self {
        Self {
            jobs: self.jobs.clone(),
            queues: self.queues.clone(),
            idempotency: self.idempotency.clone(),
            dead_letters: self.dead_letters.clone(),
            event_broadcaster: self.event_broadcaster.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobMessage;

    fn test_message() -> JobMessage {
        JobMessage::new("tts.synthesize", "default")
    }

    #[tokio::test]
    async fn test_enqueue_dequeue() {
        let backend = MemoryBackend::new();
        let ctx = QueueCtx::new();
        let message = test_message();

        let job_id = backend.enqueue(ctx.clone(), message).await.unwrap();

        let leased = backend.dequeue(ctx, &["default"]).await.unwrap().unwrap();
        assert_eq!(leased.record.job_id, job_id);
        assert_eq!(leased.record.attempt, 1);
    }

    #[tokio::test]
    async fn test_idempotency() {
        let backend = MemoryBackend::new();
        let ctx = QueueCtx::new();
        let message = test_message().with_idempotency_key("test_key");

        let job_id1 = backend.enqueue(ctx.clone(), message.clone()).await.unwrap();
        let job_id2 = backend.enqueue(ctx, message).await.unwrap();

        assert_eq!(job_id1, job_id2);
    }

    #[tokio::test]
    async fn test_cancel_wins() {
        let backend = MemoryBackend::new();
        let ctx = QueueCtx::new();
        let message = test_message();

        let job_id = backend.enqueue(ctx.clone(), message).await.unwrap();
        let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();

        let canceled = backend.cancel(ctx.clone(), job_id.clone()).await.unwrap();
        assert!(canceled);

        let result = backend.ack_complete(ctx, job_id, leased.lease_token, None).await;
        assert!(matches!(result, Err(QueueError::JobCanceled)));
    }

    #[tokio::test]
    async fn test_dead_letter_after_max_retries() {
        let backend = MemoryBackend::new();
        let ctx = QueueCtx::new();
        let message = test_message().with_max_retries(0);

        let job_id = backend.enqueue(ctx.clone(), message).await.unwrap();

        let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
        assert_eq!(leased.record.attempt, 1);

        backend
            .ack_fail(ctx.clone(), job_id.clone(), leased.lease_token, "boom".into(), None)
            .await
            .unwrap();

        let dlq = backend.dead_letter(ctx, "default").await.unwrap();
        assert_eq!(dlq.len(), 1);
        assert_eq!(dlq[0].job_id, job_id);
    }
}
