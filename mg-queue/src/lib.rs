//! Durable job queue: lease-based dequeue, cancel-wins semantics, scoped
//! idempotency, and a dead-letter stream for jobs that exhaust their
//! retries (spec.md §4.2). Task dispatch itself — mapping a `task_name` to
//! a handler — lives in `mg-worker`, not here.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod schedule;
pub mod types;

pub use adapter::{QueueAdapter, QueueConfig};
pub use backend::QueueBackend;
pub use error::{QueueError, QueueResult};
pub use schedule::{PeriodicSchedule, Scheduler};
pub use types::{
    JobEvent, JobId, JobMessage, JobPriority, JobRecord, JobStatus, LeasedJob, QueueCapabilities,
    QueueCtx,
};

pub mod prelude {
    pub use crate::{JobId, JobMessage, JobPriority, JobStatus, QueueAdapter, QueueBackend, QueueCtx, QueueError, QueueResult};
    pub use async_trait::async_trait;
}
