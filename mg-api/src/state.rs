//! Shared application state every handler extracts via `axum::State`.
//! Mirrors the teacher's own `DogAxumState` in shape (a cheaply cloneable
//! handle into the app), just holding the job-engine's concrete
//! store/queue/health/jwt handles instead of a generic service registry.

use std::sync::Arc;

use mg_auth::JwtService;
use mg_queue::QueueBackend;
use mg_store::StoreBackend;
use mg_worker::HealthProbe;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreBackend>,
    pub queue: Arc<dyn QueueBackend>,
    pub health: Arc<dyn HealthProbe>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn StoreBackend>,
        queue: Arc<dyn QueueBackend>,
        health: Arc<dyn HealthProbe>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self { store, queue, health, jwt }
    }
}
