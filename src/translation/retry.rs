/*!
 * Retry execution with classification-driven exponential backoff.
 *
 * Wraps a single provider call. Retryable failures (rate limits, server
 * errors, timeouts) consume retry budget with exponentially growing,
 * jittered delays; non-retryable failures (auth, invalid request) are
 * returned on first occurrence without sleeping. Cancellation is honored
 * before every attempt and before every backoff sleep.
 */

use log::warn;
use rand::Rng;
use std::future::Future;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::{ProviderError, RetryError};

/// Backoff and budget parameters for one tier
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total network attempts allowed, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay_ms: u64,
    /// Ceiling for the exponential schedule, before jitter
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Policy with a custom attempt budget and default delays
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }
}

/// Executes one operation under a retry policy
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create an executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Backoff before attempt `attempt` (2-based): doubling from the initial
    /// delay, capped, then stretched by up to 10% of uniform jitter.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(2).min(16);
        let base = self
            .policy
            .initial_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.policy.max_delay_ms);
        let jitter: f64 = rand::rng().random_range(0.0..=0.1);
        Duration::from_millis((base as f64 * (1.0 + jitter)) as u64)
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// The first attempt runs immediately. A non-retryable error is returned
    /// as [`RetryError::Fatal`] without consuming further budget; exhausting
    /// the budget yields [`RetryError::AllRetriesExhausted`] wrapping the
    /// last underlying error.
    pub async fn execute<T, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 1..=self.policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            if attempt > 1 {
                let delay = self.backoff_delay(attempt);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() => {
                    warn!(
                        "attempt {}/{} failed: {}",
                        attempt, self.policy.max_attempts, error
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(RetryError::Fatal(error)),
            }
        }

        Err(RetryError::AllRetriesExhausted {
            attempts: self.policy.max_attempts,
            last: last_error
                .unwrap_or_else(|| ProviderError::ConnectionError("no attempt made".to_string())),
        })
    }
}
