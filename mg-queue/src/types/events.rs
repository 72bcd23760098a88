use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JobId;

/// Minimal stable event protocol for structured observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobEvent {
    Enqueued { job_id: JobId, queue: String, task_name: String, at: DateTime<Utc> },
    Leased { job_id: JobId, lease_until: DateTime<Utc>, at: DateTime<Utc> },
    Retrying { job_id: JobId, retry_at: DateTime<Utc>, error: String, at: DateTime<Utc> },
    Completed { job_id: JobId, at: DateTime<Utc> },
    Failed { job_id: JobId, error: String, at: DateTime<Utc> },
    DeadLettered { job_id: JobId, error: String, at: DateTime<Utc> },
    Canceled { job_id: JobId, at: DateTime<Utc> },
}

impl JobEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Enqueued { .. } => "enqueued",
            Self::Leased { .. } => "leased",
            Self::Retrying { .. } => "retrying",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::DeadLettered { .. } => "dead_lettered",
            Self::Canceled { .. } => "canceled",
        }
    }

    pub fn job_id(&self) -> &JobId {
        match self {
            Self::Enqueued { job_id, .. }
            | Self::Leased { job_id, .. }
            | Self::Retrying { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Failed { job_id, .. }
            | Self::DeadLettered { job_id, .. }
            | Self::Canceled { job_id, .. } => job_id,
        }
    }
}
