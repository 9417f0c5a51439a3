//! In-flight request deduplication.
//!
//! At most one pending entry exists per dedup key. Concurrent callers with the
//! same key await one shared future and observe the same value or the same
//! error. The entry is removed when that future settles, success or failure,
//! after any internal retries.
//!
//! If every caller drops its handle before completion the entry stays in the
//! table; the next caller with the same key joins it and drives it to the end.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;

use crate::error::Result;

/// A network operation that several callers may await.
pub type SharedResponse = Shared<BoxFuture<'static, Result<Value>>>;

/// Outcome of admitting a request into the pending table.
pub enum Admission {
    /// An identical request was in flight; await its result.
    Joined(SharedResponse),
    /// Served without a network call.
    Ready(Value),
    /// This caller started the network operation.
    Started(SharedResponse),
}

/// Table of in-flight requests keyed by dedup key.
#[derive(Default, Clone)]
pub struct PendingRequests {
    inflight: Arc<Mutex<HashMap<String, SharedResponse>>>,
}

impl PendingRequests {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, SharedResponse>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Join, short-circuit, or start a request for `key`.
    ///
    /// Under one lock: an existing entry is joined; otherwise `ready` may
    /// answer without I/O (a cache hit); otherwise `start` builds the network
    /// operation, which is registered and removed again once it settles.
    pub fn admit<R, S>(&self, key: &str, ready: R, start: S) -> Admission
    where
        R: FnOnce() -> Option<Value>,
        S: FnOnce() -> BoxFuture<'static, Result<Value>>,
    {
        let mut table = self.table();
        if let Some(existing) = table.get(key) {
            tracing::debug!(key, "joining in-flight request");
            return Admission::Joined(existing.clone());
        }
        if let Some(value) = ready() {
            return Admission::Ready(value);
        }

        let operation = start();
        let registry = self.clone();
        let owned_key = key.to_string();
        let shared = async move {
            let result = operation.await;
            registry.table().remove(&owned_key);
            result
        }
        .boxed()
        .shared();

        table.insert(key.to_string(), shared.clone());
        Admission::Started(shared)
    }

    /// Number of requests currently in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.table().contains_key(key)
    }
}

impl std::fmt::Debug for PendingRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequests")
            .field("inflight", &self.len())
            .finish()
    }
}

impl std::fmt::Debug for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Joined(_) => f.write_str("Joined"),
            Self::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Self::Started(_) => f.write_str("Started"),
        }
    }
}
