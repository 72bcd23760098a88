//! `FatalSystemError` — process-level failures the worker can't route
//! through a job's own retry/dead-letter path: config didn't load, a
//! backend couldn't be reached at startup, a scheduled task's own
//! maintenance logic blew up. Mirrors the two-tier wrap-and-reclassify
//! shape of `mg-queue::error::{QueueError, JobError}`, one level up: where
//! `StepError`/`PipelineError` classify a single job's failure,
//! `FatalSystemError` classifies failures of the worker itself.

use thiserror::Error;

use mg_core::ConfigError;
use mg_pipeline::PipelineError;
use mg_queue::QueueError;
use mg_store::StoreError;

#[derive(Error, Debug)]
pub enum FatalSystemError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("queue backend error: {0}")]
    Queue(#[from] QueueError),

    #[error("store backend error: {0}")]
    Store(#[from] StoreError),

    #[error("unrecognized task: {0}")]
    UnknownTask(String),

    #[error("task '{task_name}' panicked: {message}")]
    TaskPanicked { task_name: String, message: String },
}

impl FatalSystemError {
    /// A `PipelineError` never escapes as fatal — `JobExecutor::run_once`
    /// always classifies it into an `ack_complete`/`ack_fail` decision.
    /// This conversion exists only for call sites (tests, `?` in a
    /// maintenance task) that need a single error type to propagate.
    pub fn from_pipeline(err: PipelineError) -> Self {
        Self::TaskPanicked { task_name: err.step_name.to_string(), message: err.to_string() }
    }
}
