//! `/health`, `/ready`, `/health/live`, `/health/extended` — unauthenticated
//! liveness/readiness probes backed by whichever `HealthProbe` the app was
//! wired against (spec.md §6).

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/health/live", get(live))
        .route("/health/extended", get(extended))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn live(State(state): State<AppState>) -> StatusCode {
    if state.health.live().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<mg_worker::HealthReport>) {
    let report = state.health.extended().await;
    let code = if report.is_ready() { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(report))
}

async fn extended(State(state): State<AppState>) -> Json<mg_worker::HealthReport> {
    Json(state.health.extended().await)
}
