use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobId, JobMessage, LeaseToken};

/// Job status lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobStatus {
    Enqueued,
    Scheduled,
    Processing { lease_until: DateTime<Utc> },
    Retrying { retry_at: DateTime<Utc> },
    Completed { completed_at: DateTime<Utc> },
    Failed { failed_at: DateTime<Utc>, error: String },
    Canceled { canceled_at: DateTime<Utc> },
    /// Moved to the dead-letter stream after exceeding `max_retries`
    /// (spec.md §4.2).
    DeadLettered { at: DateTime<Utc>, error: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed { .. } | Self::Canceled { .. } | Self::DeadLettered { .. }
        )
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Enqueued => true,
            Self::Retrying { retry_at } => *retry_at <= now,
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Enqueued => "enqueued",
            Self::Scheduled => "scheduled",
            Self::Processing { .. } => "processing",
            Self::Retrying { .. } => "retrying",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Canceled { .. } => "canceled",
            Self::DeadLettered { .. } => "dead_lettered",
        }
    }
}

/// Job record — mutable runtime state stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub message: JobMessage,
    pub status: JobStatus,
    pub attempt: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub lease_token: Option<LeaseToken>,
    pub lease_until: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(job_id: JobId, message: JobMessage) -> Self {
        let now = Utc::now();
        let status = if message.run_at > now { JobStatus::Scheduled } else { JobStatus::Enqueued };

        Self {
            job_id,
            message,
            status,
            attempt: 0,
            created_at: now,
            updated_at: now,
            last_error: None,
            lease_token: None,
            lease_until: None,
        }
    }

    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        match (&self.status, &self.lease_until) {
            (JobStatus::Processing { .. }, Some(lease_until)) => *lease_until < now,
            _ => false,
        }
    }

    pub fn set_error(&mut self, error: String) {
        self.last_error = Some(error);
        self.updated_at = Utc::now();
    }

    pub fn start_processing(&mut self, lease_token: LeaseToken, lease_until: DateTime<Utc>) {
        self.status = JobStatus::Processing { lease_until };
        self.lease_token = Some(lease_token);
        self.lease_until = Some(lease_until);
        self.updated_at = Utc::now();
    }

    pub fn complete(&mut self) {
        self.status = JobStatus::Completed { completed_at: Utc::now() };
        self.lease_token = None;
        self.lease_until = None;
        self.updated_at = Utc::now();
    }

    pub fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed { failed_at: Utc::now(), error: error.clone() };
        self.last_error = Some(error);
        self.lease_token = None;
        self.lease_until = None;
        self.updated_at = Utc::now();
    }

    pub fn dead_letter(&mut self, error: String) {
        self.status = JobStatus::DeadLettered { at: Utc::now(), error: error.clone() };
        self.last_error = Some(error);
        self.lease_token = None;
        self.lease_until = None;
        self.updated_at = Utc::now();
    }

    pub fn schedule_retry(&mut self, retry_at: DateTime<Utc>) {
        self.status = JobStatus::Retrying { retry_at };
        self.attempt += 1;
        self.lease_token = None;
        self.lease_until = None;
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = JobStatus::Canceled { canceled_at: Utc::now() };
        self.lease_token = None;
        self.lease_until = None;
        self.updated_at = Utc::now();
    }
}

/// A job that has been leased for processing.
#[derive(Debug, Clone)]
pub struct LeasedJob {
    pub record: JobRecord,
    pub lease_token: LeaseToken,
    pub lease_until: DateTime<Utc>,
}

impl LeasedJob {
    pub fn job_id(&self) -> &JobId {
        &self.record.job_id
    }

    pub fn message(&self) -> &JobMessage {
        &self.record.message
    }

    pub fn lease_valid(&self, now: DateTime<Utc>) -> bool {
        self.lease_until > now
    }
}
