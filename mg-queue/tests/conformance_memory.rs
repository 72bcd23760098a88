use std::time::Duration;
use chrono::Utc;
use tokio_stream::StreamExt;

use mg_queue::{
    QueueCtx, JobMessage, JobPriority, JobStatus, JobEvent,
    backend::{QueueBackend, memory::MemoryBackend}
};

fn test_message() -> JobMessage {
    JobMessage::new("test_job", "default")
}

fn job_with_priority(priority: u8) -> JobMessage {
    test_message().with_priority(JobPriority::new(priority))
}

async fn receive_next_event(stream: &mut mg_queue::backend::BoxStream<JobEvent>) -> JobEvent {
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("timeout waiting for event")
        .expect("stream ended")
}

/// A1. Dequeue leases atomically
#[tokio::test]
async fn test_dequeue_leases_atomically() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    let job_id = backend.enqueue(ctx.clone(), job_message).await.unwrap();

    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();

    assert_eq!(leased.record.job_id, job_id);
    assert!(!leased.lease_token.as_str().is_empty());
    assert!(leased.lease_until > Utc::now());

    let status = backend.get_status(ctx.clone(), job_id.clone()).await.unwrap();
    assert!(matches!(status, JobStatus::Processing { .. }));

    let record = backend.get_record(ctx, job_id).await.unwrap();
    assert_eq!(record.lease_token, Some(leased.lease_token));
    assert_eq!(record.lease_until, Some(leased.lease_until));
}

/// A2. Only lease holder can ack
#[tokio::test]
async fn test_only_lease_holder_can_ack() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    let fake_token = mg_queue::types::LeaseToken::from("invalid_token");

    let result = backend.ack_complete(ctx, leased.record.job_id, fake_token, None).await;

    assert!(matches!(result, Err(mg_queue::QueueError::InvalidLeaseToken)));
}

/// A3. Lease expiry race produces LeaseExpired
#[tokio::test]
async fn test_lease_expiry_race() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    backend.force_lease_expiry(leased.record.job_id.clone()).await.unwrap();

    let result = backend.ack_complete(ctx, leased.record.job_id, leased.lease_token, None).await;

    assert!(matches!(result, Err(mg_queue::QueueError::LeaseExpired)));
}

/// A4. Expired lease becomes eligible again after the reaper runs
#[tokio::test]
async fn test_expired_lease_becomes_eligible_again() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let first_lease = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    backend.force_lease_expiry(first_lease.record.job_id.clone()).await.unwrap();

    let reaper = mg_queue::backend::memory::LeaseReaper::new(std::sync::Arc::new(backend.clone()));
    reaper.reap_expired_leases().await.unwrap();

    let second_lease = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();

    assert_eq!(second_lease.record.job_id, first_lease.record.job_id);
    assert_ne!(second_lease.lease_token, first_lease.lease_token);
    assert_eq!(second_lease.record.attempt, first_lease.record.attempt + 1);

    let result = backend.ack_complete(ctx, first_lease.record.job_id, first_lease.lease_token, None).await;
    assert!(result.is_err());
}

/// B1. At-most-once completion transition
#[tokio::test]
async fn test_at_most_once_completion_transition() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    backend.ack_complete(ctx.clone(), leased.record.job_id.clone(), leased.lease_token.clone(), None).await.unwrap();

    let result = backend.ack_complete(ctx, leased.record.job_id, leased.lease_token, None).await;

    assert!(matches!(result, Err(mg_queue::QueueError::JobAlreadyTerminal)));
}

/// C1. Cancel wins over ack_complete
#[tokio::test]
async fn test_cancel_wins_over_ack_complete() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();

    let cancel_result = backend.cancel(ctx.clone(), leased.record.job_id.clone()).await.unwrap();
    let ack_result = backend.ack_complete(ctx.clone(), leased.record.job_id.clone(), leased.lease_token, None).await;

    assert!(cancel_result);
    assert!(matches!(ack_result, Err(mg_queue::QueueError::JobCanceled)));

    let status = backend.get_status(ctx, leased.record.job_id).await.unwrap();
    assert!(matches!(status, JobStatus::Canceled { .. }));
}

/// D1. Retryable error schedules a retry
#[tokio::test]
async fn test_retryable_error_schedules_retry() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    let retry_at = Utc::now() + chrono::Duration::seconds(60);

    backend.ack_fail(ctx.clone(), leased.record.job_id.clone(), leased.lease_token, "retryable error".to_string(), Some(retry_at)).await.unwrap();

    let status = backend.get_status(ctx.clone(), leased.record.job_id.clone()).await.unwrap();
    assert!(matches!(status, JobStatus::Retrying { retry_at: scheduled } if scheduled == retry_at));

    let early_dequeue = backend.dequeue(ctx, &["default"]).await.unwrap();
    assert!(early_dequeue.is_none());
}

/// D2. Exhausting retries dead-letters the job
#[tokio::test]
async fn test_exhausted_retries_dead_letter() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message().with_max_retries(0);

    backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();

    backend.ack_fail(ctx.clone(), leased.record.job_id.clone(), leased.lease_token, "boom".to_string(), None).await.unwrap();

    let status = backend.get_status(ctx.clone(), leased.record.job_id.clone()).await.unwrap();
    assert!(matches!(status, JobStatus::DeadLettered { .. }));

    let dlq = backend.dead_letter(ctx, "default").await.unwrap();
    assert_eq!(dlq.len(), 1);
}

/// E1. Idempotency returns the same job id for a still-pending duplicate
#[tokio::test]
async fn test_idempotency_returns_same_job_id() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message().with_idempotency_key("test_key");

    let job_id1 = backend.enqueue(ctx.clone(), job_message.clone()).await.unwrap();
    let job_id2 = backend.enqueue(ctx, job_message).await.unwrap();

    assert_eq!(job_id1, job_id2);
}

/// E2. Idempotency is scoped by (queue, task_name, key)
#[tokio::test]
async fn test_idempotency_scope_isolation() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let base_message = test_message().with_idempotency_key("same_key");

    let job_id1 = backend.enqueue(ctx.clone(), base_message.clone()).await.unwrap();

    let different_queue = JobMessage::new("test_job", "other_queue").with_idempotency_key("same_key");
    let job_id2 = backend.enqueue(ctx.clone(), different_queue).await.unwrap();

    let different_task = JobMessage::new("other_task", "default").with_idempotency_key("same_key");
    let job_id3 = backend.enqueue(ctx, different_task).await.unwrap();

    let job_ids = vec![job_id1, job_id2, job_id3];
    let unique_ids: std::collections::HashSet<_> = job_ids.iter().collect();
    assert_eq!(unique_ids.len(), 3);
}

/// F1. Priority then FIFO ordering
#[tokio::test]
async fn test_priority_then_fifo_ordering() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();

    let low_job = job_with_priority(1);
    let job_id1 = backend.enqueue(ctx.clone(), low_job).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    let high_newer = job_with_priority(10);
    let job_id2 = backend.enqueue(ctx.clone(), high_newer).await.unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    let high_older = job_with_priority(10);
    let job_id3 = backend.enqueue(ctx.clone(), high_older).await.unwrap();

    let first = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    let second = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    let third = backend.dequeue(ctx, &["default"]).await.unwrap().unwrap();

    let high_jobs = vec![job_id2, job_id3];
    assert!(high_jobs.contains(&first.record.job_id));
    assert!(high_jobs.contains(&second.record.job_id));
    assert_eq!(third.record.job_id, job_id1);
}

/// G1. Emits Enqueued event
#[tokio::test]
async fn test_emits_enqueued_event() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    let mut event_stream = backend.event_stream(ctx.clone());

    let job_id = backend.enqueue(ctx, job_message.clone()).await.unwrap();

    let event = receive_next_event(&mut event_stream).await;
    match event {
        JobEvent::Enqueued { job_id: event_job_id, queue, task_name, .. } => {
            assert_eq!(event_job_id, job_id);
            assert_eq!(queue, job_message.queue);
            assert_eq!(task_name, job_message.task_name);
        }
        other => panic!("expected Enqueued event, got: {:?}", other),
    }
}

/// G2. Emits lifecycle events
#[tokio::test]
async fn test_emits_lifecycle_events() {
    let backend = MemoryBackend::new();
    let ctx = QueueCtx::new();
    let job_message = test_message();

    let mut event_stream = backend.event_stream(ctx.clone());

    let job_id = backend.enqueue(ctx.clone(), job_message).await.unwrap();
    let enqueued_event = receive_next_event(&mut event_stream).await;
    assert!(matches!(enqueued_event, JobEvent::Enqueued { job_id: event_job_id, .. } if event_job_id == job_id));

    let leased = backend.dequeue(ctx.clone(), &["default"]).await.unwrap().unwrap();
    let leased_event = receive_next_event(&mut event_stream).await;
    assert!(matches!(leased_event, JobEvent::Leased { job_id: event_job_id, .. } if event_job_id == job_id));

    backend.ack_complete(ctx, job_id.clone(), leased.lease_token, None).await.unwrap();
    let completed_event = receive_next_event(&mut event_stream).await;
    assert!(matches!(completed_event, JobEvent::Completed { job_id: event_job_id, .. } if event_job_id == job_id));
}
