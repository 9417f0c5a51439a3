//! The backend access client.
//!
//! [`ApiClient::request`] is the single orchestration point every service
//! call goes through. Per logical request:
//!
//! ```text
//! DEDUP_CHECK -> CACHE_CHECK -> THROTTLE_WAIT -> IN_FLIGHT -> SUCCESS
//!                                                  |  ^
//!                                                  v  |
//!                                                 RETRY      -> FAILURE
//! ```
//!
//! - A caller joining an identical in-flight request awaits that request and
//!   incurs no throttle wait of its own.
//! - A cache hit returns immediately, bypassing throttle and network.
//! - Retries re-enter `IN_FLIGHT` directly after their backoff sleep.
//!
//! The cache, the pending table and the throttle timestamp are fields of the
//! client rather than globals, so tests build isolated instances. Clones
//! share all three.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::cache::{CacheStats, ResponseCache};
use super::dedup::{Admission, PendingRequests};
use super::http::{
    DEFAULT_TIMEOUT, DEVELOPMENT_BASE_URL, build_client, classify_status,
    classify_transport_error, join_url,
};
use super::request::{self, RequestOptions};
use super::retry::{DEFAULT_BACKOFF_BASE, RetryPolicy};
use super::throttle::{DEFAULT_MIN_INTERVAL, Throttle};
use crate::error::{EukError, Result};

/// Settings for one [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Transport timeout per attempt.
    pub timeout: Duration,
    /// Minimum spacing between issued requests.
    pub min_interval: Duration,
    /// First backoff delay; doubles per retry.
    pub backoff_base: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEVELOPMENT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    #[must_use]
    pub const fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }
}

/// A binary response (PDF documents).
#[derive(Debug, Clone)]
pub struct Download {
    /// Raw `Content-Disposition` header, if the server sent one.
    pub content_disposition: Option<String>,
    /// Raw `Content-Type` header.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

struct Inner {
    http: Client,
    base_url: String,
    timeout: Duration,
    throttle: Throttle,
    retry: RetryPolicy,
    cache: Mutex<ResponseCache>,
    pending: PendingRequests,
}

/// Shared, cloneable backend client.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("min_interval", &self.inner.throttle.min_interval())
            .field("pending", &self.inner.pending)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is empty or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(EukError::ConfigInvalid {
                key: "api.base_url".to_string(),
                value: config.base_url,
                message: "adresa servera ne sme biti prazna".to_string(),
            });
        }
        let http = build_client(config.timeout)?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                timeout: config.timeout,
                throttle: Throttle::new(config.min_interval),
                retry: RetryPolicy::new(config.backoff_base),
                cache: Mutex::new(ResponseCache::new()),
                pending: PendingRequests::new(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Absolute URL for a backend-relative path.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.inner.base_url, path)
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Perform a request and return the parsed JSON body.
    ///
    /// `path` is backend-relative and may include a query string.
    ///
    /// # Errors
    ///
    /// - [`EukError::Validation`] if `token` is supplied but empty (no I/O).
    /// - [`EukError::SessionExpired`], [`EukError::Forbidden`],
    ///   [`EukError::NotFound`] without retry.
    /// - [`EukError::RateLimited`] / [`EukError::ServerError`] once the retry
    ///   budget is exhausted.
    /// - [`EukError::Network`] / [`EukError::Timeout`] on transport failure.
    /// - [`EukError::InvalidJson`] if a 2xx body does not parse.
    pub async fn request(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> Result<Value> {
        request::validate_token(token)?;

        let key = request::dedup_key(&options, path, token);
        let cache_key = options
            .is_cacheable()
            .then(|| request::cache_key(path, token));

        let admission = self.inner.pending.admit(
            &key,
            || {
                let hit = cache_key.as_deref().and_then(|k| self.cache().get(k));
                if hit.is_some() {
                    tracing::debug!(path, "cache hit");
                }
                hit
            },
            || {
                let client = self.clone();
                let path = path.to_string();
                let token = token.map(str::to_string);
                let cache_key = cache_key.clone();
                async move { client.execute(&path, options, token.as_deref(), cache_key).await }
                    .boxed()
            },
        );

        match admission {
            Admission::Ready(value) => Ok(value),
            Admission::Joined(shared) | Admission::Started(shared) => shared.await,
        }
    }

    /// [`request`](Self::request) and deserialize the body into `T`.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request); a body of the wrong shape is reported
    /// as [`EukError::InvalidJson`].
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
    ) -> Result<T> {
        let value = self.request(path, options, token).await?;
        serde_json::from_value(value).map_err(|e| EukError::InvalidJson {
            url: self.url_for(path),
            message: e.to_string(),
        })
    }

    /// POST `body` and return the binary response (PDF generation).
    ///
    /// Shares throttling, retry and status classification with
    /// [`request`](Self::request) but never deduplicates or caches.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request), minus JSON parsing.
    pub async fn download(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
        retries: u32,
    ) -> Result<Download> {
        request::validate_token(token)?;
        let options = RequestOptions::post(body).retries(retries);
        let url = self.url_for(path);

        let response = self.send_with_retry(&url, &options, token).await?;
        let header = |name| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_disposition = header(CONTENT_DISPOSITION);
        let content_type = header(CONTENT_TYPE);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(&e, &url, self.inner.timeout))?;

        Ok(Download {
            content_disposition,
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    /// Drop every cached response whose key contains `needle`.
    pub fn invalidate(&self, needle: &str) -> usize {
        let removed = self.cache().invalidate_matching(needle);
        tracing::debug!(needle, removed, "cache invalidated");
        removed
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache().clear();
        tracing::debug!("cache cleared");
    }

    /// Store a value directly, e.g. a fail-open fallback.
    pub fn cache_put(&self, path: &str, token: Option<&str>, value: Value, ttl: Duration) {
        self.cache()
            .insert(request::cache_key(path, token), value, ttl);
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Number of requests currently in flight.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.pending.len()
    }

    async fn execute(
        &self,
        path: &str,
        options: RequestOptions,
        token: Option<&str>,
        cache_key: Option<String>,
    ) -> Result<Value> {
        let url = self.url_for(path);
        let response = self.send_with_retry(&url, &options, token).await?;
        let value = self.parse_body(response, &url).await?;

        if let Some(key) = cache_key {
            self.cache().insert(key, value.clone(), options.cache_ttl);
        }
        Ok(value)
    }

    /// Throttle once, then attempt until success, a non-retryable status, or
    /// an exhausted budget.
    async fn send_with_retry(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Response> {
        self.inner.throttle.acquire().await;

        let initial = options.retries;
        let mut remaining = initial;
        let mut attempts = 0;
        loop {
            attempts += 1;
            tracing::debug!(method = %options.method, url, attempt = attempts, "sending request");
            let response = self
                .send(url, options, token)
                .await
                .map_err(|e| classify_transport_error(&e, url, self.inner.timeout))?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if RetryPolicy::is_retryable_status(status) && remaining > 0 {
                let delay = self.inner.retry.delay(initial, remaining);
                tracing::warn!(
                    url,
                    status = status.as_u16(),
                    retries_left = remaining - 1,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
                remaining -= 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let err = classify_status(status, url, &body, attempts);
            tracing::debug!(url, code = err.error_code(), "request failed");
            return Err(err);
        }
    }

    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> std::result::Result<Response, reqwest::Error> {
        let mut builder = self
            .inner
            .http
            .request(options.method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in &options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &options.body {
            builder = builder.body(body.to_string());
        }
        builder.send().await
    }

    async fn parse_body(&self, response: Response, url: &str) -> Result<Value> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport_error(&e, url, self.inner.timeout))?;

        // Only bodiless statuses map to null; an empty 200/201 is corrupt.
        if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| EukError::InvalidJson {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_rejects_empty_base_url() {
        let err = ApiClient::new(ClientConfig::new("  ")).unwrap_err();
        assert!(matches!(err, EukError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_url_for_trims_trailing_slash() {
        let client = ApiClient::new(ClientConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(
            client.url_for("/api/euk/predmeti?page=0&size=20"),
            "http://localhost:8080/api/euk/predmeti?page=0&size=20"
        );
    }

    #[tokio::test]
    async fn test_empty_token_fails_without_network() {
        // Nothing listens on this port; a network attempt would yield Network.
        let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let err = client
            .request("/api/routes", RequestOptions::get(), Some(""))
            .await
            .unwrap_err();
        assert!(matches!(err, EukError::Validation { .. }));
        assert_eq!(client.pending_requests(), 0);
    }

    #[test]
    fn test_cache_put_and_invalidate() {
        let client = ApiClient::new(ClientConfig::default()).unwrap();
        client.cache_put(
            "/api/admin/users?page=0",
            Some("tok"),
            Value::Bool(true),
            Duration::from_secs(60),
        );
        client.cache_put("/api/routes", Some("tok"), Value::Null, Duration::from_secs(60));
        assert_eq!(client.invalidate("users"), 1);
        assert_eq!(client.cache_stats().entries, 1);
        client.clear_cache();
        assert_eq!(client.cache_stats().entries, 0);
    }

    #[traced_test]
    #[test]
    fn test_invalidation_is_logged() {
        let client = ApiClient::new(ClientConfig::default()).unwrap();
        client.cache_put("/api/euk/kategorije", Some("tok"), Value::Null, Duration::from_secs(60));
        assert_eq!(client.invalidate("kategorije"), 1);
        assert!(logs_contain("cache invalidated"));
        assert!(logs_contain("removed=1"));
    }
}
