//! In-memory response cache with per-entry TTL.
//!
//! Entries are replaced wholesale, never mutated. An entry is valid for reads
//! while `now - stored_at < ttl`; expired entries are evicted lazily on the
//! next lookup of their key. Invalidation is by substring match on the key,
//! not a dependency graph: callers know which substrings to bust after which
//! writes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;

/// A cached JSON response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Whether this entry may still be served at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// Hit/miss counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Response cache keyed by [`cache_key`](super::request::cache_key).
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
}

impl ResponseCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `key`, evicting it if expired.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    /// Look up `key` as of `now`.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_valid_at(now) => {
                self.hits += 1;
                Some(entry.data.clone())
            }
            Some(_) => {
                self.entries.remove(key);
                self.misses += 1;
                tracing::debug!(key, "cache entry expired");
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store `data` under `key` for `ttl`.
    pub fn insert(&mut self, key: impl Into<String>, data: Value, ttl: Duration) {
        self.insert_at(key, data, ttl, Instant::now());
    }

    /// Store `data` under `key` as of `now`.
    pub fn insert_at(&mut self, key: impl Into<String>, data: Value, ttl: Duration, now: Instant) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                data,
                stored_at: now,
                ttl,
            },
        );
    }

    /// Remove every entry whose key contains `needle`. Returns how many were removed.
    pub fn invalidate_matching(&mut self, needle: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(needle));
        before - self.entries.len()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}
