//! Router assembly. The generic `AxumApp<R, P>` service-registry builder
//! the teacher's `dog-axum` exposed is gone — there is exactly one app
//! shape here — but the request-id/trace layering it applied to every
//! mounted router is kept verbatim.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::response::Response;
use axum::{middleware, Router};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::health;
use crate::jobs;
use crate::state::AppState;

async fn ensure_request_id(req: Request<Body>, next: middleware::Next) -> Response {
    let request_id_header = HeaderName::from_static("x-request-id");

    let mut req = req;
    let request_id = req
        .headers()
        .get(&request_id_header)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if req.headers().get(&request_id_header).is_none() {
        if let Ok(v) = HeaderValue::from_str(&request_id) {
            req.headers_mut().insert(request_id_header.clone(), v);
        }
    }

    let mut res = next.run(req).await;

    if res.headers().get(&request_id_header).is_none() {
        if let Ok(v) = HeaderValue::from_str(&request_id) {
            res.headers_mut().insert(request_id_header, v);
        }
    }

    res
}

pub fn build_router(state: AppState) -> Router<()> {
    Router::new()
        .nest("/jobs", jobs::router())
        .merge(health::router())
        .layer(middleware::from_fn(ensure_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve<A>(state: AppState, addr: A) -> anyhow::Result<()>
where
    A: ToSocketAddrs,
{
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
