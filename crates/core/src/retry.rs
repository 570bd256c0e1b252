//! Bounded retry with randomized exponential backoff.
//!
//! Every outbound network call in IdeaForge goes through a [`RetryPolicy`]:
//! the chat provider (via `RetryProvider`), issue-tracker pagination and the
//! documentation crawler. Errors classify themselves with [`Retryable`];
//! only transient failures are retried.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

/// Classifies an error as worth retrying or not.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// How a retried operation ultimately failed.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-transient error; returned on the attempt it occurred.
    Fatal(E),
    /// Every attempt failed with a transient error.
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// The underlying error, regardless of how the retry loop ended.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted { last, .. } => last,
        }
    }
}

/// Attempt budget and backoff bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    min_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    /// 4 attempts, waits between 1s and 10s.
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1), Duration::from_secs(10))
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` counts the first try and is at least 1.
    pub fn new(max_attempts: u32, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// A policy that retries without waiting. Intended for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// A policy that tries exactly once.
    pub fn no_retry() -> Self {
        Self::immediate(1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Upper bound of the wait after the `failures`-th failed attempt:
    /// `min(max_delay, min_delay * 2^(failures - 1))`.
    pub fn backoff_ceiling(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1);
        let factor = 1u32.checked_shl(exp).unwrap_or(u32::MAX);
        self.min_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Sample the wait after the `failures`-th failed attempt, uniformly
    /// between `min_delay` and [`backoff_ceiling`](Self::backoff_ceiling).
    pub fn backoff(&self, failures: u32) -> Duration {
        let lo = self.min_delay.as_millis() as u64;
        let hi = self.backoff_ceiling(failures).as_millis() as u64;
        if hi <= lo {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    /// Run `op` until it succeeds, fails non-transiently, or the attempt
    /// budget is spent. `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut attempt = 1;
        loop {
            debug!(label, attempt, max_attempts = self.max_attempts, "Attempting call");

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(RetryError::Fatal(e)),
                Err(e) if attempt >= self.max_attempts => {
                    warn!(label, attempts = attempt, error = %e, "Retries exhausted");
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (transient: {})", self.transient)
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    #[test]
    fn default_policy_matches_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.min_delay(), Duration::from_secs(1));
        assert_eq!(policy.max_delay(), Duration::from_secs(10));
    }

    #[test]
    fn backoff_ceiling_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_ceiling(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_ceiling(2), Duration::from_secs(2));
        assert_eq!(policy.backoff_ceiling(3), Duration::from_secs(4));
        assert_eq!(policy.backoff_ceiling(5), Duration::from_secs(10));
        assert_eq!(policy.backoff_ceiling(64), Duration::from_secs(10));
    }

    #[test]
    fn backoff_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for failures in 1..8 {
            let delay = policy.backoff(failures);
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= policy.backoff_ceiling(failures));
        }
    }

    #[test]
    fn zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_fourth_attempt() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result = policy
            .run("test", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 4 {
                        Err(TestError { transient: true })
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // Three waits: at least 1s each, at most 1s + 2s + 4s.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed <= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: true }) }
            })
            .await;

        match result {
            Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("Expected Exhausted, got: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let policy = RetryPolicy::immediate(4);
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: false }) }
            })
            .await;

        assert!(matches!(result, Err(RetryError::Fatal(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
