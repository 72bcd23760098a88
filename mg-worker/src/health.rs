//! `HealthProbe` — the liveness/readiness contract `mg-api`'s `/health`,
//! `/ready`, `/health/live`, and `/health/extended` endpoints are meant to
//! call into (spec.md §6). Defined here, not in `mg-api`, because only the
//! worker runtime holds live handles to the store and queue backends; the
//! HTTP layer just forwards to whichever runtime it's wired against.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub store_reachable: bool,
    pub queue_reachable: bool,
    pub active_tasks: usize,
    pub capacity: usize,
}

impl HealthReport {
    pub fn is_ready(&self) -> bool {
        self.store_reachable && self.queue_reachable
    }
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Cheap liveness check: is the process itself still scheduling work.
    async fn live(&self) -> bool;

    /// Full readiness check: store and queue backends are reachable and
    /// the worker has spare task slots (spec.md §6 "`/health/extended`").
    async fn extended(&self) -> HealthReport;
}
