//! Catalog entities: reference data owned by a `User`, read once per
//! execution into the pipeline context snapshot (SPEC_FULL "DATA MODEL").
//! Independently mutable; a `Job` captures their ids, not a copy, so stale
//! catalog edits only affect future executions.

use chrono::{DateTime, Utc};
use mg_core::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    pub owner_id: UserId,
    pub name: String,
    pub code: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub owner_id: UserId,
    pub name: String,
    pub provider_voice_id: String,
    pub language_id: String,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Named style adapter applied to image generation, with a blend weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleAdapter {
    pub name: String,
    pub weight: f32,
}

/// How a digital-human clip is composited onto the generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HumanInsertionMode {
    Fullscreen,
    Corner,
}

/// Image-generation pipeline selection for a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerateType {
    Legacy,
    Adapter,
}

/// Typed extras for `Topic`, replacing the original's free-form map with
/// documented conservative defaults (SPEC_FULL §9 Open Questions: no
/// transitions, fullscreen, legacy generator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicExtras {
    pub generate_type: GenerateType,
    pub enable_srt_concat_transition: bool,
    pub human_insertion_mode: HumanInsertionMode,
    pub scene_duration_seconds: f32,
}

impl Default for TopicExtras {
    fn default() -> Self {
        Self {
            generate_type: GenerateType::Legacy,
            enable_srt_concat_transition: false,
            human_insertion_mode: HumanInsertionMode::Fullscreen,
            scene_duration_seconds: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub owner_id: UserId,
    pub name: String,
    pub prompt_image_prefix: String,
    pub cover_prompt: Option<String>,
    pub style_adapter_list: Vec<StyleAdapter>,
    pub extras: TopicExtras,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub owner_id: UserId,
    pub name: String,
    pub logo_location: Option<String>,
    pub digital_human_video_path: Option<String>,
    pub subtitle_color_name: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}
