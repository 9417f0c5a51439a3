//! Retry with exponential backoff.
//!
//! Only 429 and 5xx responses are retried. Connection failures and
//! 401/403/404 surface immediately. With an initial budget `N`, the `k`-th
//! retry (`k = N - remaining`) sleeps `base * 2^k`, so delays strictly
//! increase and at most `N + 1` attempts are made.

use std::time::Duration;

use reqwest::StatusCode;

/// Base delay observed against the backend: 1s, 2s, 4s, ...
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Upper bound on the exponent so huge budgets cannot overflow.
const MAX_EXPONENT: u32 = 16;

/// Backoff schedule shared by every request of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(base_delay: Duration) -> Self {
        Self { base_delay }
    }

    /// Whether a response with `status` is worth another attempt.
    #[must_use]
    pub fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    /// Delay before the next attempt, given the initial budget and what remains.
    #[must_use]
    pub fn delay(&self, initial: u32, remaining: u32) -> Duration {
        let exponent = initial.saturating_sub(remaining).min(MAX_EXPONENT);
        self.base_delay.saturating_mul(1 << exponent)
    }

    /// The full sleep schedule for a budget of `retries`.
    #[must_use]
    pub fn schedule(&self, retries: u32) -> Vec<Duration> {
        (0..retries)
            .map(|k| self.delay(retries, retries - k))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(RetryPolicy::is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(RetryPolicy::is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!RetryPolicy::is_retryable_status(StatusCode::CONFLICT));
    }

    #[test]
    fn test_default_schedule_is_1_2_4_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(3),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_delays_strictly_increase() {
        let policy = RetryPolicy::new(Duration::from_millis(10));
        let schedule = policy.schedule(5);
        assert_eq!(schedule.len(), 5);
        assert!(schedule.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_zero_budget_has_empty_schedule() {
        assert!(RetryPolicy::default().schedule(0).is_empty());
    }

    #[test]
    fn test_exponent_is_capped() {
        let policy = RetryPolicy::new(Duration::from_millis(1));
        assert_eq!(policy.delay(100, 0), Duration::from_millis(1 << 16));
    }
}
