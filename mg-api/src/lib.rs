//! mg-api: the collaborator-facing HTTP surface for the media generation
//! job engine (spec.md §6). Route shapes and DTOs over `mg-store`/
//! `mg-queue`, a bearer-JWT boundary, and health/readiness endpoints backed
//! by `mg-worker::HealthProbe` — no business logic of its own.

pub mod app;
pub mod auth;
pub mod error;
pub mod health;
pub mod health_probe;
pub mod jobs;
pub mod state;

pub use app::{build_router, serve};
pub use error::ApiError;
pub use health_probe::ApiHealthProbe;
pub use state::AppState;
