//! Bounded retry with delay for navigation steps
//!
//! | Failure | Action |
//! |---------|--------|
//! | Retryable (timeout, not ready, network, HTTP 429/5xx) | Sleep `delay`, try again, up to `max_attempts` |
//! | Fatal (slot/page exhaustion, HTTP 4xx, bad locator) | Return immediately |
//! | Cancellation | Return immediately, dropping the in-flight attempt |

use crate::config::CrawlerConfig;
use crate::crawler::NavigationError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a wrapped step did not produce a value
#[derive(Debug, Error)]
pub enum RetryError {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: NavigationError,
    },

    #[error("{0}")]
    Fatal(NavigationError),

    #[error("cancelled")]
    Cancelled,
}

impl RetryError {
    /// The navigation error behind the failure, if any
    pub fn navigation_error(&self) -> Option<&NavigationError> {
        match self {
            Self::Exhausted { last, .. } => Some(last),
            Self::Fatal(error) => Some(error),
            Self::Cancelled => None,
        }
    }
}

/// Attempt bookkeeping for one wrapped step
#[derive(Debug, Default)]
pub struct RetryState {
    pub attempt_count: u32,
    pub last_error: Option<NavigationError>,
}

/// Retries retryable failures a bounded number of times
#[derive(Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    retries: AtomicU64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retries: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Attempts beyond the first, summed over every step run so far
    pub fn retries_performed(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Runs `op` until it succeeds, fails fatally, runs out of attempts, or
    /// `cancel` fires
    ///
    /// At most `max_attempts` attempts are made, with `delay` between
    /// consecutive attempts and none after the last.
    pub async fn run<T, F>(
        &self,
        label: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError>
    where
        F: AsyncFnMut() -> Result<T, NavigationError>,
    {
        let mut state = RetryState::default();

        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }
            state.attempt_count += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                result = op() => result,
            };

            let error = match result {
                Ok(value) => {
                    if let Some(previous) = &state.last_error {
                        tracing::info!(
                            "{} succeeded on attempt {}/{} after: {}",
                            label,
                            state.attempt_count,
                            self.max_attempts,
                            previous
                        );
                    }
                    return Ok(value);
                }
                Err(error) if !error.is_retryable() => return Err(RetryError::Fatal(error)),
                Err(error) => error,
            };

            tracing::warn!(
                "{} failed (attempt {}/{}): {}",
                label,
                state.attempt_count,
                self.max_attempts,
                error
            );

            if state.attempt_count >= self.max_attempts {
                return Err(RetryError::Exhausted {
                    attempts: state.attempt_count,
                    last: error,
                });
            }
            state.last_error = Some(error);

            self.retries.fetch_add(1, Ordering::Relaxed);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn not_ready() -> NavigationError {
        NavigationError::PageNotReady {
            url: "https://catalog.test/exhibitors?page=1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let cancel = CancellationToken::new();
        let mut calls = 0;

        let result = policy
            .run("step", &cancel, async || {
                calls += 1;
                Ok::<_, NavigationError>(7)
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
        assert_eq!(policy.retries_performed(), 0);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::from_millis(5));
        let cancel = CancellationToken::new();
        let mut calls = 0;

        let result = policy
            .run("step", &cancel, async || {
                calls += 1;
                if calls < 3 {
                    Err(not_ready())
                } else {
                    Ok("loaded")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "loaded");
        assert_eq!(calls, 3);
        assert_eq!(policy.retries_performed(), 2);
    }

    #[tokio::test]
    async fn test_exhausts_after_exactly_max_attempts() {
        let delay = Duration::from_millis(20);
        let policy = RetryPolicy::new(4, delay);
        let cancel = CancellationToken::new();
        let mut calls = 0;
        let started = Instant::now();

        let result: Result<(), _> = policy
            .run("step", &cancel, async || {
                calls += 1;
                Err(not_ready())
            })
            .await;

        assert_eq!(calls, 4);
        assert!(started.elapsed() >= delay * 3);
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(last, NavigationError::PageNotReady { .. }));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_failure_is_not_retried() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let cancel = CancellationToken::new();
        let mut calls = 0;

        let result: Result<(), _> = policy
            .run("step", &cancel, async || {
                calls += 1;
                Err(NavigationError::SlotNotFound { page: 1, slot: 4 })
            })
            .await;

        assert_eq!(calls, 1);
        assert_eq!(policy.retries_performed(), 0);
        assert!(matches!(
            result,
            Err(RetryError::Fatal(NavigationError::SlotNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut calls = 0;

        let result: Result<(), _> = policy
            .run("step", &cancel, async || {
                calls += 1;
                Ok(())
            })
            .await;

        assert_eq!(calls, 0);
        assert!(matches!(result, Err(RetryError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_delay() {
        let policy = RetryPolicy::new(3, Duration::from_secs(60));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let started = Instant::now();

        let result: Result<(), _> = policy
            .run("step", &cancel, async || {
                trigger.cancel();
                Err(not_ready())
            })
            .await;

        assert!(matches!(result, Err(RetryError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
