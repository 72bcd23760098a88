//! API process entry point: loads config, wires the in-memory store/queue
//! backends the worker also uses, builds a `JwtService` from the shared
//! `jwt_secret`, and serves the job-lifecycle + health router until killed.

use std::sync::Arc;

use mg_api::{AppState, ApiHealthProbe};
use mg_auth::{JwtOptions, JwtService};
use mg_core::{AppConfig, RawConfig};
use mg_queue::backend::memory::MemoryBackend;
use mg_store::{InMemoryStore, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .init();

    let raw = RawConfig::from_env("MG__");
    let config = AppConfig::load(&raw)?;

    tracing::info!(environment = %config.environment, "starting mg-api");

    let store: Arc<dyn StoreBackend> = Arc::new(InMemoryStore::new());
    let queue = Arc::new(MemoryBackend::new());

    let jwt_options = JwtOptions { secret: Some(config.jwt_secret.clone()), ..JwtOptions::default() };
    jwt_options.validate().map_err(anyhow::Error::msg)?;
    let jwt = Arc::new(JwtService::new(jwt_options));

    let queue: Arc<dyn mg_queue::QueueBackend> = queue;
    let health = Arc::new(ApiHealthProbe::new(store.clone(), queue.clone()));

    let state = AppState::new(store, queue, health, jwt);

    let bind_addr = std::env::var("MG_API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    tracing::info!(%bind_addr, "listening");

    mg_api::serve(state, bind_addr).await
}
