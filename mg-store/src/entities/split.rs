//! `JobSplit` — a scene boundary for a `Job` (spec.md §3).

use mg_core::{JobId, SplitId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSplit {
    pub id: SplitId,
    pub job_id: JobId,
    /// Ordered index within the job; composite-unique with `job_id`.
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
    pub prompt: String,
    pub image_candidates: Vec<String>,
    pub selected_image_id: Option<String>,
    pub video_path: Option<String>,
}

impl JobSplit {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}
