//! Global request throttle.
//!
//! Any two network-issuing calls are separated by at least `min_interval`,
//! regardless of endpoint. Later callers are delayed, never dropped. The
//! timestamp is taken after the wait and before the request is sent, so the
//! spacing bounds issuance rate rather than completion rate.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between issued requests observed against the backend.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Process-wide issuance throttle.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_issued: Mutex<Option<Instant>>,
}

impl Throttle {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_issued: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request may be issued and claim the slot.
    ///
    /// Callers queue on the internal lock, so issuance is serialized in
    /// arrival order. Returns how long this caller slept.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_issued.lock().await;
        let waited = match *last {
            Some(prev) => {
                let elapsed = prev.elapsed();
                if elapsed < self.min_interval {
                    let remaining = self.min_interval - elapsed;
                    tracing::debug!(wait_ms = remaining.as_millis() as u64, "throttling request");
                    tokio::time::sleep(remaining).await;
                    remaining
                } else {
                    Duration::ZERO
                }
            }
            None => Duration::ZERO,
        };
        *last = Some(Instant::now());
        waited
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
