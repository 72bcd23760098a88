//! `StatusUpdater` — persists execution/step status as the pipeline runs
//! (spec.md §4.4, §4.6). Grounded on `status_updater.py`'s `JobStatusUpdater`,
//! reduced to a trait so production code updates `mg-store` while tests use
//! a no-op recorder that just remembers what was written.

use async_trait::async_trait;
use mg_core::ExecutionStatus;
use mg_store::{ExecutionStore, JobExecution, StoreResult};

#[async_trait]
pub trait StatusUpdater: Send + Sync {
    async fn update_execution_status(
        &self,
        execution: &mut JobExecution,
        status: ExecutionStatus,
        status_detail: String,
    ) -> StoreResult<()>;
}

/// Production implementation: writes through to whatever `ExecutionStore`
/// backend is configured (spec.md §4.1).
pub struct StoreStatusUpdater<S: ExecutionStore> {
    store: S,
}

impl<S: ExecutionStore> StoreStatusUpdater<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ExecutionStore + Send + Sync> StatusUpdater for StoreStatusUpdater<S> {
    async fn update_execution_status(
        &self,
        execution: &mut JobExecution,
        status: ExecutionStatus,
        status_detail: String,
    ) -> StoreResult<()> {
        execution.transition(status, status_detail)?;
        self.store.update_execution(execution.clone()).await?;
        Ok(())
    }
}

/// Test double: records every transition it was asked to make without
/// touching a store backend.
#[derive(Default)]
pub struct RecordingStatusUpdater {
    pub writes: std::sync::Mutex<Vec<(ExecutionStatus, String)>>,
}

impl RecordingStatusUpdater {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusUpdater for RecordingStatusUpdater {
    async fn update_execution_status(
        &self,
        execution: &mut JobExecution,
        status: ExecutionStatus,
        status_detail: String,
    ) -> StoreResult<()> {
        execution.transition(status, status_detail.clone())?;
        self.writes.lock().unwrap().push((status, status_detail));
        Ok(())
    }
}
