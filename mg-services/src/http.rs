use std::time::Duration;

use crate::ServiceError;

/// Build a `reqwest::Client` the way every HTTP-backed service adapter in
/// this crate wants one: rustls, a connect timeout, and no implicit retry —
/// retry policy belongs to the worker/pipeline layer, not the client.
pub fn build_client(connect_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .expect("reqwest client with default TLS backend")
}

/// Wrap a single call with a hard deadline. No retry happens here by design
/// (spec.md §4.3): on timeout we return `ServiceError::Transient` so the
/// caller's own retry policy (if any) decides what to do next.
pub async fn with_deadline<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T, ServiceError>
where
    F: std::future::Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::timeout(what)),
    }
}

/// Classify a response the way `base_client.py`'s `_request` does:
/// `raise_for_status()` first, then parse.
pub async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(ServiceError::from_status(status.as_u16(), snippet))
}
