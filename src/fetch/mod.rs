//! Fetch-and-cache wrapper every upstream lookup goes through.

mod throttle;

pub use throttle::Throttle;

use crate::cache::{CacheKey, ResponseCache};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected upstream response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0} is not configured")]
    MissingApiKey(&'static str),
}

/// Description of one upstream GET request.
///
/// Only `namespace`, `path` and `query` feed the cache key; `secret_query`
/// (API keys and the like) is sent but never written into a key or file name.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    namespace: &'static str,
    base_url: String,
    path: String,
    query: Vec<(String, String)>,
    secret_query: Vec<(String, String)>,
    rate_limited: bool,
}

impl ApiRequest {
    pub fn new(namespace: &'static str, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace,
            base_url: base_url.into(),
            path: path.into(),
            query: Vec::new(),
            secret_query: Vec::new(),
            rate_limited: false,
        }
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn secret_query(mut self, name: &str, value: impl ToString) -> Self {
        self.secret_query.push((name.to_string(), value.to_string()));
        self
    }

    /// Route this request through the process-wide throttle.
    pub fn rate_limited(mut self) -> Self {
        self.rate_limited = true;
        self
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_request(self.namespace, &self.path, &self.query)
    }
}

/// Returns the cached value for `key` if it is younger than `max_age`,
/// otherwise runs `fetch` and caches its result.
///
/// Fetch errors are returned untouched: nothing is cached, nothing is retried
/// and no stale entry is substituted. A failed cache write is not an error.
pub async fn fetch_cached<F, Fut, E>(
    cache: &ResponseCache,
    key: &CacheKey,
    max_age: Duration,
    fetch: F,
) -> Result<Value, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, E>>,
{
    if let Some(value) = cache.get_cached_data(key, max_age).await {
        debug!("Cache hit for {}", key);
        return Ok(value);
    }

    debug!("Cache miss for {}, fetching upstream", key);
    let value = fetch().await?;
    if !cache.set_cached_data(key, &value).await {
        debug!("Could not cache {}; the next lookup will refetch", key);
    }
    Ok(value)
}

/// HTTP client plus the shared cache and throttle.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    cache: ResponseCache,
    throttle: Arc<Throttle>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, cache: ResponseCache, throttle: Throttle) -> Self {
        Self {
            http,
            cache,
            throttle: Arc::new(throttle),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub async fn get_json(&self, request: &ApiRequest, max_age: Duration) -> Result<Value, FetchError> {
        fetch_cached(&self.cache, &request.cache_key(), max_age, || self.send(request)).await
    }

    pub async fn get_typed<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        max_age: Duration,
    ) -> Result<T, FetchError> {
        let value = self.get_json(request, max_age).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn send(&self, request: &ApiRequest) -> Result<Value, FetchError> {
        if request.rate_limited {
            self.throttle.wait_turn().await;
        }

        debug!("GET {} {:?}", request.endpoint(), request.query);
        let response = self
            .http
            .get(request.endpoint())
            .query(&request.query)
            .query(&request.secret_query)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}
