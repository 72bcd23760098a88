use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use crate::http::{build_client, ensure_success, with_deadline};
use crate::ServiceResult;

/// Request to an LLM completion endpoint. Nothing in the example pack or
/// `original_source/` grounds this client — the original system has no LLM
/// step — so this is built plainly to satisfy the cached-completion
/// requirement without inventing a richer shape than the callers need.
#[derive(Debug, Clone, Serialize)]
pub struct LlmRequest {
    pub model: String,
    pub prompt: String,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { model: model.into(), prompt: prompt.into() }
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
}

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> ServiceResult<LlmResponse>;
}

type CacheKey = (String, String);

/// Wraps any `LlmService` with an in-memory cache keyed on `(prompt, model)`,
/// holding entries for at least `ttl` before they're eligible for eviction.
/// Plain `parking_lot::RwLock<HashMap<_>>` — the simplest thing that
/// satisfies "cached for >= 24h" without pulling in a cache crate nothing
/// else in the workspace uses.
pub struct CachedLlmService<L: LlmService> {
    inner: L,
    ttl: Duration,
    cache: Arc<RwLock<HashMap<CacheKey, (String, Instant)>>>,
}

impl<L: LlmService> CachedLlmService<L> {
    /// `ttl` should be at least 24h in production; tests use shorter windows.
    pub fn new(inner: L, ttl: Duration) -> Self {
        Self { inner, ttl, cache: Arc::new(RwLock::new(HashMap::new())) }
    }

    fn cached(&self, key: &CacheKey) -> Option<String> {
        let guard = self.cache.read();
        let (text, stored_at) = guard.get(key)?;
        if stored_at.elapsed() < self.ttl {
            Some(text.clone())
        } else {
            None
        }
    }
}

#[async_trait]
impl<L: LlmService> LlmService for CachedLlmService<L> {
    async fn complete(&self, request: LlmRequest) -> ServiceResult<LlmResponse> {
        let key = (request.prompt.clone(), request.model.clone());

        if let Some(text) = self.cached(&key) {
            return Ok(LlmResponse { text });
        }

        let response = self.inner.complete(request).await?;
        self.cache.write().insert(key, (response.text.clone(), Instant::now()));
        Ok(response)
    }
}

/// Generic HTTP-backed LLM client speaking an OpenAI-style chat completion
/// shape. Not grounded on any example in this workspace; kept minimal.
pub struct HttpLlmService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpLlmService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: build_client(Duration::from_secs(10)), base_url: base_url.into(), timeout: Duration::from_secs(60) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(serde::Deserialize)]
struct CompletionWireResponse {
    text: String,
}

#[async_trait]
impl LlmService for HttpLlmService {
    async fn complete(&self, request: LlmRequest) -> ServiceResult<LlmResponse> {
        let url = format!("{}/v1/complete", self.base_url);
        let client = self.client.clone();

        with_deadline(self.timeout, "llm completion", async move {
            let response = client.post(&url).json(&request).send().await?;
            let response = ensure_success(response).await?;
            let wire: CompletionWireResponse = response.json().await
                .map_err(|e| crate::ServiceError::PermanentServer(e.to_string()))?;
            Ok(LlmResponse { text: wire.text })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmService for Arc<CountingLlm> {
        async fn complete(&self, request: LlmRequest) -> ServiceResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LlmResponse { text: format!("echo: {}", request.prompt) })
        }
    }

    #[tokio::test]
    async fn repeated_prompt_hits_cache() {
        let inner = Arc::new(CountingLlm { calls: AtomicUsize::new(0) });
        let cached = CachedLlmService::new(inner.clone(), Duration::from_secs(60));

        let req = LlmRequest::new("gpt", "hello");
        let first = cached.complete(req.clone()).await.unwrap();
        let second = cached.complete(req).await.unwrap();

        assert_eq!(first.text, second.text);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_calls_through_again() {
        let inner = Arc::new(CountingLlm { calls: AtomicUsize::new(0) });
        let cached = CachedLlmService::new(inner.clone(), Duration::from_millis(10));

        let req = LlmRequest::new("gpt", "hello");
        cached.complete(req.clone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        cached.complete(req).await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
