//! Error taxonomy for the pipeline framework (spec.md §7). Each step catches
//! its internal failures, classifies them, and raises a `StepError`; the
//! executor wraps the first one it sees in a `PipelineError` and stops.
//! Mirrors the two-tier wrap-and-reclassify shape of
//! `mg-queue::error::{QueueError, JobError}`.

use thiserror::Error;

use mg_services::ServiceError;
use mg_store::StoreError;

/// Step precondition failures (spec.md §7 `ValidationError`) — never
/// retried, surfaced to the caller as the equivalent of HTTP 422.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("{step}: missing required input '{field}'")]
    MissingInput { step: &'static str, field: &'static str },

    #[error("{step}: {message}")]
    Invalid { step: &'static str, message: String },
}

/// A step's classified failure (spec.md §7 `StepError`).
#[derive(Error, Debug)]
pub enum StepError {
    #[error("[{step_name}] validation failed: {source}")]
    Validation {
        step_name: &'static str,
        #[source]
        source: ValidationError,
    },

    #[error("[{step_name}] transient service error: {source}")]
    Transient {
        step_name: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("[{step_name}] permanent service error: {source}")]
    Permanent {
        step_name: &'static str,
        #[source]
        source: ServiceError,
    },

    #[error("[{step_name}] store error: {source}")]
    Store {
        step_name: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("[{step_name}] I/O error: {source}")]
    Io {
        step_name: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("[{step_name}] {message}")]
    Other { step_name: &'static str, message: String },
}

impl StepError {
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Validation { step_name, .. }
            | Self::Transient { step_name, .. }
            | Self::Permanent { step_name, .. }
            | Self::Store { step_name, .. }
            | Self::Io { step_name, .. }
            | Self::Other { step_name, .. } => step_name,
        }
    }

    /// Whether the job executor should retry by re-enqueueing rather than
    /// dead-lettering (spec.md §4.6 step 6, classification split).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            Self::Io { .. } => true,
            Self::Validation { .. } | Self::Permanent { .. } | Self::Store { .. } | Self::Other { .. } => false,
        }
    }

    pub fn from_service(step_name: &'static str, source: ServiceError) -> Self {
        if source.is_retryable() {
            Self::Transient { step_name, source }
        } else {
            Self::Permanent { step_name, source }
        }
    }
}

/// Wraps a `StepError` at the executor boundary with job identity (spec.md
/// §7 `PipelineError`). Causes the execution row to go `FAILED`.
#[derive(Error, Debug)]
#[error("pipeline failed for job {job_id} at step '{step_name}': {source}")]
pub struct PipelineError {
    pub job_id: String,
    pub step_name: &'static str,
    #[source]
    pub source: StepError,
}

impl PipelineError {
    pub fn new(job_id: impl Into<String>, source: StepError) -> Self {
        Self { job_id: job_id.into(), step_name: source.step_name(), source }
    }

    pub fn is_retryable(&self) -> bool {
        self.source.is_retryable()
    }
}
