use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::{backend::QueueBackend, JobMessage, JobPriority, QueueCtx, QueueResult};

/// A periodic producer registration (spec.md §4.2 scheduled/periodic tasks,
/// e.g. catalog refresh, stale-execution sweeps).
#[derive(Debug, Clone)]
pub struct PeriodicSchedule {
    pub id: String,
    pub task_name: String,
    pub queue: String,
    pub period: Duration,
    pub args: Value,
    pub priority: JobPriority,
}

impl PeriodicSchedule {
    pub fn new(id: impl Into<String>, task_name: impl Into<String>, queue: impl Into<String>, period: Duration) -> Self {
        Self {
            id: id.into(),
            task_name: task_name.into(),
            queue: queue.into(),
            period,
            args: Value::Null,
            priority: JobPriority::default(),
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Idempotency key ties every tick to its schedule and the wall-clock
    /// minute it fired in, so a scheduler restart inside the same minute
    /// can't double-enqueue.
    fn tick_idempotency_key(&self) -> String {
        let minute = Utc::now().format("%Y%m%dT%H%M");
        format!("schedule:{}:{}", self.id, minute)
    }
}

/// Drives a set of [`PeriodicSchedule`]s against a backend, one ticker per
/// schedule's period. Mirrors the lease reaper's own ticker-loop shape.
pub struct Scheduler<B: QueueBackend> {
    backend: Arc<B>,
    schedules: Arc<RwLock<HashMap<String, PeriodicSchedule>>>,
}

impl<B: QueueBackend + Send + Sync + 'static> Scheduler<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend, schedules: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn register(&self, schedule: PeriodicSchedule) {
        self.schedules.write().insert(schedule.id.clone(), schedule);
    }

    pub fn unregister(&self, id: &str) {
        self.schedules.write().remove(id);
    }

    /// Runs every registered schedule's ticker loop concurrently. Never
    /// returns under normal operation.
    pub async fn run(self: Arc<Self>) -> QueueResult<()> {
        let ids: Vec<String> = self.schedules.read().keys().cloned().collect();
        let mut handles = Vec::with_capacity(ids.len());

        for id in ids {
            let scheduler = self.clone();
            handles.push(tokio::spawn(async move { scheduler.run_one(&id).await }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        Ok(())
    }

    async fn run_one(&self, id: &str) {
        let period = match self.schedules.read().get(id) {
            Some(s) => s.period,
            None => return,
        };

        let mut ticker = interval(period);
        loop {
            ticker.tick().await;

            let schedule = match self.schedules.read().get(id).cloned() {
                Some(s) => s,
                None => {
                    info!(schedule_id = id, "schedule removed, stopping ticker");
                    return;
                }
            };

            if let Err(e) = self.fire(&schedule).await {
                warn!(schedule_id = %schedule.id, error = %e, "periodic enqueue failed");
            } else {
                debug!(schedule_id = %schedule.id, "periodic tick enqueued");
            }
        }
    }

    async fn fire(&self, schedule: &PeriodicSchedule) -> QueueResult<()> {
        let message = JobMessage::new(schedule.task_name.clone(), schedule.queue.clone())
            .with_args(schedule.args.clone())
            .with_priority(schedule.priority)
            .with_idempotency_key(schedule.tick_idempotency_key());

        self.backend.enqueue(QueueCtx::new(), message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;

    #[tokio::test]
    async fn fire_enqueues_with_stable_idempotency_key() {
        let backend = Arc::new(MemoryBackend::new());
        let scheduler = Scheduler::new(backend.clone());
        let schedule = PeriodicSchedule::new("catalog-refresh", "catalog.refresh", "maintenance", Duration::from_secs(60));

        scheduler.fire(&schedule).await.unwrap();
        scheduler.fire(&schedule).await.unwrap();

        let ctx = QueueCtx::new();
        let first = backend.dequeue(ctx.clone(), &["maintenance"]).await.unwrap();
        assert!(first.is_some());
        let second = backend.dequeue(ctx, &["maintenance"]).await.unwrap();
        assert!(second.is_none(), "duplicate tick within the same minute must be suppressed");
    }
}
