//! `Job` — immutable configuration of a video to produce (spec.md §3).

use chrono::{DateTime, Utc};
use mg_core::{JobId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Landscape
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub owner_id: UserId,
    pub title: String,
    pub content: String,
    pub language_id: String,
    pub voice_id: String,
    pub topic_id: String,
    pub account_id: String,
    pub speech_speed: f32,
    pub orientation: Orientation,
    /// Free-form extras the original system scattered defaults across call
    /// sites for; kept as a map here only for fields `TopicExtras` does not
    /// already type (spec.md §9 Open Questions).
    pub extras: Value,
    pub run_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
