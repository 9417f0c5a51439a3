//! Request options and key derivation for the access layer.
//!
//! A logical request is identified twice:
//! - the **dedup key** `(method, path, token prefix)` joins concurrent
//!   identical requests onto one network call;
//! - the **cache key** `(path, GET, token prefix)` addresses cached reads.
//!
//! Only the first [`TOKEN_PREFIX_LEN`] characters of the bearer token take
//! part in either key, so full credentials never sit in the tables.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::error::{EukError, Result};

/// Characters of the bearer token that participate in dedup/cache keys.
pub const TOKEN_PREFIX_LEN: usize = 10;

/// TTL used when caching is requested without an explicit TTL.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Retry budget used by reads unless the call site asks for more.
pub const DEFAULT_READ_RETRIES: u32 = 1;

/// Retry budget used by writes.
pub const DEFAULT_WRITE_RETRIES: u32 = 3;

/// Per-call options for [`ApiClient::request`](super::client::ApiClient::request).
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method (GET when unspecified).
    pub method: Method,
    /// JSON body, sent as `application/json`.
    pub body: Option<Value>,
    /// Extra headers merged over the defaults.
    pub headers: Vec<(String, String)>,
    /// Number of retries allowed on 429/5xx.
    pub retries: u32,
    /// Opt into read caching (GET only).
    pub use_cache: bool,
    /// TTL for a cached response.
    pub cache_ttl: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
            retries: DEFAULT_READ_RETRIES,
            use_cache: false,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl RequestOptions {
    /// A GET with the default read retry budget.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// A POST carrying `body`, with the write retry budget.
    #[must_use]
    pub fn post(body: Value) -> Self {
        Self::write(Method::POST, Some(body))
    }

    /// A POST without a body, with the write retry budget.
    #[must_use]
    pub fn post_empty() -> Self {
        Self::write(Method::POST, None)
    }

    /// A PUT carrying `body`, with the write retry budget.
    #[must_use]
    pub fn put(body: Value) -> Self {
        Self::write(Method::PUT, Some(body))
    }

    /// A DELETE with the write retry budget.
    #[must_use]
    pub fn delete() -> Self {
        Self::write(Method::DELETE, None)
    }

    fn write(method: Method, body: Option<Value>) -> Self {
        Self {
            method,
            body,
            retries: DEFAULT_WRITE_RETRIES,
            ..Self::default()
        }
    }

    /// Builder: sets the retry budget.
    #[must_use]
    pub const fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Builder: caches a successful GET for `ttl`.
    #[must_use]
    pub const fn cached(mut self, ttl: Duration) -> Self {
        self.use_cache = true;
        self.cache_ttl = ttl;
        self
    }

    /// Builder: toggles caching, keeping the configured TTL.
    #[must_use]
    pub const fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Builder: adds an extra header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether this request reads from and writes to the response cache.
    #[must_use]
    pub fn is_cacheable(&self) -> bool {
        self.use_cache && self.method == Method::GET
    }
}

/// Reject a supplied token that is empty or whitespace.
///
/// # Errors
///
/// Returns [`EukError::Validation`] before any network I/O happens.
pub fn validate_token(token: Option<&str>) -> Result<()> {
    match token {
        Some(t) if t.trim().is_empty() => Err(EukError::validation(
            "token",
            "token mora biti neprazan string",
        )),
        _ => Ok(()),
    }
}

/// First [`TOKEN_PREFIX_LEN`] characters of the token, or empty.
#[must_use]
pub fn token_prefix(token: Option<&str>) -> String {
    token
        .map(|t| t.chars().take(TOKEN_PREFIX_LEN).collect())
        .unwrap_or_default()
}

/// Key that joins concurrent identical requests.
///
/// Requests carrying a body also fold in a fingerprint of that body, so two
/// writes with different payloads to the same path are never merged.
#[must_use]
pub fn dedup_key(options: &RequestOptions, path: &str, token: Option<&str>) -> String {
    let mut key = format!("{}:{}:{}", options.method, path, token_prefix(token));
    if let Some(body) = &options.body {
        let mut hasher = DefaultHasher::new();
        body.to_string().hash(&mut hasher);
        key.push_str(&format!(":{:016x}", hasher.finish()));
    }
    key
}

/// Key under which a cacheable GET is stored.
#[must_use]
pub fn cache_key(path: &str, token: Option<&str>) -> String {
    format!("{path}:GET:{}", token_prefix(token))
}
