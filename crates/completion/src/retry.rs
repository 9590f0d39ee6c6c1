//! Fixed-backoff retry for rate-limited completion calls.
//!
//! Only [`CompletionError::RateLimited`] is retried. Everything else returns on
//! the attempt that produced it.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::CompletionError;

/// Attempt budget and the pause between rate-limited attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, counting the first. Clamped to at least 1.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Runs `operation` until it succeeds, fails with a non-rate-limit error,
    /// or the budget is spent. The closure receives the 1-based attempt number.
    ///
    /// No sleep follows the final attempt.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, CompletionError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CompletionError>>,
    {
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match operation(attempt).await {
                Err(err) if err.is_rate_limited() && attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        backoff_ms = self.backoff.as_millis() as u64,
                        "completion rate limited, backing off"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(err) if err.is_rate_limited() => break,
                other => return other,
            }
        }

        warn!(attempts = max_attempts, "completion retries exhausted");
        Err(CompletionError::RetriesExhausted {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn always_rate_limited_stops_after_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let start = Instant::now();

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CompletionError::RateLimited) }
            })
            .await;

        assert_eq!(result, Err(CompletionError::RetriesExhausted { attempts: 5 }));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        // Four pauses between five attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(240));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_rate_limits() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        let result = policy
            .run(|attempt| async move {
                if attempt < 3 {
                    Err(CompletionError::RateLimited)
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let start = Instant::now();

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CompletionError::Service("HTTP error 500".into())) }
            })
            .await;

        assert_eq!(result, Err(CompletionError::Service("HTTP error 500".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::from_secs(60));
        assert_eq!(policy.max_attempts, 1);

        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CompletionError::RateLimited) }
            })
            .await;

        assert_eq!(result, Err(CompletionError::RetriesExhausted { attempts: 1 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
