use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JobPriority;

/// Job message — immutable submission data. The `{task_name, args, kwargs,
/// trace_id}` envelope shape is spec.md §4.2 verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMessage {
    pub task_name: String,
    pub args: Value,
    pub kwargs: Value,
    pub queue: String,
    pub priority: JobPriority,
    pub max_retries: u32,
    pub run_at: DateTime<Utc>,
    pub idempotency_key: Option<String>,
    pub trace_id: Option<String>,
}

impl JobMessage {
    pub fn new(task_name: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            args: Value::Null,
            kwargs: Value::Null,
            queue: queue.into(),
            priority: JobPriority::default(),
            max_retries: 3,
            run_at: Utc::now(),
            idempotency_key: None,
            trace_id: None,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_kwargs(mut self, kwargs: Value) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_delay(mut self, delay: chrono::Duration) -> Self {
        self.run_at = Utc::now() + delay;
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn is_eligible(&self) -> bool {
        self.run_at <= Utc::now()
    }
}
