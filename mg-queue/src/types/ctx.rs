use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Context carried with every queue operation for observability
/// correlation (spec.md §4.2 envelope carries a `trace_id`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueCtx {
    pub trace_id: Option<String>,
    pub request_id: Option<String>,
    pub tags: HashMap<String, String>,
}

impl QueueCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Scoped idempotency key: `(queue, task_name, key)` (spec.md §4.2
    /// "duplicates suppressed by job-id idempotency at the task handler").
    pub fn scoped_idempotency_key(queue: &str, task_name: &str, key: &str) -> String {
        format!("{queue}:{task_name}:{key}")
    }
}
