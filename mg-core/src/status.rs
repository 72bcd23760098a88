//! Execution status vocabulary.
//!
//! Durable values are the plain English enum variants below. Historical rows
//! (and any external system still emitting the old alphabet) are imported
//! through [`legacy_status_to_execution_status`], which mirrors the source
//! system's `STATUS_MAP` / `REVERSE_STATUS_MAP` tables one-for-one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable lifecycle status of a [`JobExecution`](crate is re-exported by mg-store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
    Timeout,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Cancelled | Self::Timeout
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Timeout => "TIMEOUT",
        }
    }

    /// Legal status edges per spec.md §3 / §8.6.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Cancelled) | (Running, Success) | (Running, Failed) | (Running, Timeout)
        )
    }
}

/// Import table for historical status strings (spec.md §6).
pub fn legacy_status_to_execution_status(s: &str) -> Option<ExecutionStatus> {
    match s.to_ascii_lowercase().as_str() {
        "pending" | "waiting" => Some(ExecutionStatus::Pending),
        "processing" | "running" | "in_progress" => Some(ExecutionStatus::Running),
        "success" | "completed" | "finished" => Some(ExecutionStatus::Success),
        "failed" | "error" => Some(ExecutionStatus::Failed),
        "cancelled" => Some(ExecutionStatus::Cancelled),
        "timeout" => Some(ExecutionStatus::Timeout),
        _ => None,
    }
}

/// A single status write, used to validate the edge-set invariant in tests
/// (spec.md §8.6) and to drive `status_detail` history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEdge {
    pub from: Option<ExecutionStatus>,
    pub to: ExecutionStatus,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_mapping_covers_every_durable_value() {
        assert_eq!(legacy_status_to_execution_status("waiting"), Some(ExecutionStatus::Pending));
        assert_eq!(legacy_status_to_execution_status("in_progress"), Some(ExecutionStatus::Running));
        assert_eq!(legacy_status_to_execution_status("finished"), Some(ExecutionStatus::Success));
        assert_eq!(legacy_status_to_execution_status("error"), Some(ExecutionStatus::Failed));
        assert_eq!(legacy_status_to_execution_status("cancelled"), Some(ExecutionStatus::Cancelled));
        assert_eq!(legacy_status_to_execution_status("timeout"), Some(ExecutionStatus::Timeout));
        assert_eq!(legacy_status_to_execution_status("bogus"), None);
    }

    #[test]
    fn transition_table_matches_spec_edges() {
        use ExecutionStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Running.can_transition_to(Success));
        assert!(Running.can_transition_to(Failed));
        assert!(Running.can_transition_to(Timeout));
        assert!(!Success.can_transition_to(Running));
        assert!(!Pending.can_transition_to(Success));
    }
}
