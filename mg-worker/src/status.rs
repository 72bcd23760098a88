//! Adapts a type-erased [`StoreBackend`] to `mg_pipeline::StatusUpdater`.
//!
//! `mg_pipeline::StoreStatusUpdater<S>` is generic over a concrete
//! `ExecutionStore` impl, but the worker only ever holds an
//! `Arc<dyn StoreBackend>` (so it can be swapped for a SQL backend without
//! recompiling the executor) — `Arc<dyn Trait>` doesn't itself implement
//! `Trait`, so this small wrapper bridges the two.

use std::sync::Arc;

use async_trait::async_trait;
use mg_core::ExecutionStatus;
use mg_pipeline::StatusUpdater;
use mg_store::{ExecutionStore, JobExecution, StoreBackend, StoreResult};

pub struct ArcStatusUpdater(pub Arc<dyn StoreBackend>);

#[async_trait]
impl StatusUpdater for ArcStatusUpdater {
    async fn update_execution_status(
        &self,
        execution: &mut JobExecution,
        status: ExecutionStatus,
        status_detail: String,
    ) -> StoreResult<()> {
        execution.transition(status, status_detail)?;
        self.0.update_execution(execution.clone()).await?;
        Ok(())
    }
}
