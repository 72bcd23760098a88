//! Job lifecycle routes (spec.md §6): create a job, read it back, and read
//! its latest execution status. Enough to demonstrate the collaborator
//! surface calling into `mg-store`/`mg-queue` — everything past "enqueue
//! the first task" is `mg-worker`'s job.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use mg_core::{ExecutionStatus, JobId, UserId};
use mg_queue::{JobMessage, QueueCtx};
use mg_store::{Filter, Job, Orientation, Query};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub content: String,
    pub language_id: String,
    pub voice_id: String,
    pub topic_id: String,
    pub account_id: String,
    #[serde(default = "default_speech_speed")]
    pub speech_speed: f32,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub extras: Value,
}

fn default_speech_speed() -> f32 {
    1.0
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub title: String,
    pub status: &'static str,
    pub created_at: chrono::DateTime<Utc>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self { id: job.id.to_string(), title: job.title, status: "queued", created_at: job.created_at }
    }
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub execution_id: Option<String>,
    pub status: Option<&'static str>,
    pub status_detail: Option<String>,
    pub result_key: HashMap<String, String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_job))
        .route("/{id}", get(get_job))
        .route("/{id}/status", get(get_job_status))
}

async fn create_job(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Json(body): Json<CreateJobRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let now = Utc::now();
    let job = Job {
        id: JobId::new(),
        owner_id,
        title: body.title,
        content: body.content,
        language_id: body.language_id,
        voice_id: body.voice_id,
        topic_id: body.topic_id,
        account_id: body.account_id,
        speech_speed: body.speech_speed,
        orientation: body.orientation,
        extras: body.extras,
        run_order: 0,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let created = state.store.create_job(job).await?;

    let message = JobMessage::new("process_video_job", "video_processing")
        .with_args(json!({ "job_id": created.id.to_string() }))
        .with_max_retries(3);
    let idempotency_key = QueueCtx::scoped_idempotency_key("video_processing", "process_video_job", created.id.as_str());
    state
        .queue
        .enqueue(QueueCtx::new().with_request_id(idempotency_key), message)
        .await?;

    Ok(Json(created.into()))
}

async fn get_job(
    State(state): State<AppState>,
    AuthenticatedUser(_owner_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = state.store.get_job(&JobId::from(id)).await?;
    Ok(Json(job.into()))
}

async fn get_job_status(
    State(state): State<AppState>,
    AuthenticatedUser(_owner_id): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiError> {
    let job_id = JobId::from(id);
    // Ensure the job exists at all before reporting on its executions.
    state.store.get_job(&job_id).await?;

    let page = state
        .store
        .list_executions(Query::new().filter(Filter::Eq("job_id".to_string(), json!(job_id.to_string()))))
        .await?;

    let latest = page.items.into_iter().max_by_key(|e| e.created_at);

    Ok(Json(match latest {
        Some(exec) => JobStatusResponse {
            job_id: job_id.to_string(),
            execution_id: Some(exec.id.to_string()),
            status: Some(status_name(exec.status)),
            status_detail: Some(exec.status_detail),
            result_key: exec.result_key,
        },
        None => JobStatusResponse {
            job_id: job_id.to_string(),
            execution_id: None,
            status: None,
            status_detail: None,
            result_key: HashMap::new(),
        },
    }))
}

fn status_name(status: ExecutionStatus) -> &'static str {
    status.name()
}
