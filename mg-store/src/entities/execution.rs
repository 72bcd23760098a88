//! `JobExecution` — one attempt at executing a `Job` (spec.md §3).

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use mg_core::{ExecutionId, ExecutionStatus, JobId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    pub id: ExecutionId,
    pub job_id: JobId,
    pub status: ExecutionStatus,
    pub status_detail: String,
    pub worker_hostname: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub error_message: Option<String>,
    /// Artifact kind -> object-store key, e.g. `"final_video" -> "videos/.../final.mp4"`.
    pub result_key: HashMap<String, String>,
    pub execution_metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobExecution {
    pub fn new(job_id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id: ExecutionId::new(),
            job_id,
            status: ExecutionStatus::Pending,
            status_detail: String::new(),
            worker_hostname: None,
            started_at: None,
            finished_at: None,
            retry_count: 0,
            error_message: None,
            result_key: HashMap::new(),
            execution_metadata: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated status transition (spec.md §3 invariants):
    /// `started_at` is set on the first PENDING->RUNNING edge, `finished_at`
    /// on any edge into a terminal state. Terminal states are never left.
    pub fn transition(&mut self, next: ExecutionStatus, detail: impl Into<String>) -> StoreResult<()> {
        if self.status.is_terminal() {
            return Err(StoreError::InvalidTransition {
                entity: "JobExecution",
                id: self.id.to_string(),
                from: self.status.name().to_string(),
                to: next.name().to_string(),
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition {
                entity: "JobExecution",
                id: self.id.to_string(),
                from: self.status.name().to_string(),
                to: next.name().to_string(),
            });
        }

        let now = Utc::now();
        if self.status == ExecutionStatus::Pending && next == ExecutionStatus::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.finished_at = Some(now);
        }

        self.status = next;
        self.status_detail = detail.into();
        self.updated_at = now;
        Ok(())
    }
}
