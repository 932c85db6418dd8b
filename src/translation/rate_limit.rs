/*!
 * Per-tier request rate limiting.
 *
 * A token bucket guards each provider tier: capacity is one second worth of
 * the configured request rate, refilled continuously. The limiter never
 * fails a caller; it only delays, and the wait is cancellable.
 */

use parking_lot::Mutex;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::RetryError;

/// Mutable token bucket state, shared by every caller of one tier
#[derive(Debug)]
struct RateLimitState {
    /// Tokens currently available
    tokens: f64,
    /// When tokens were last credited
    last_refill: Instant,
}

/// Token bucket rate limiter for one provider tier
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<RateLimitState>,
    /// Burst allowance, equal to one second of the refill rate
    capacity: f64,
    /// Tokens credited per second
    refill_per_second: f64,
}

impl RateLimiter {
    /// Create a limiter for the given sustained request rate.
    ///
    /// The bucket starts full, so a fresh limiter admits an initial burst.
    pub fn new(requests_per_second: f64) -> Self {
        let capacity = requests_per_second.max(1.0);
        Self {
            state: Mutex::new(RateLimitState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_per_second: capacity,
        }
    }

    /// Credit tokens for the time elapsed since the last refill
    fn refill(&self, state: &mut RateLimitState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = self
            .capacity
            .min(state.tokens + elapsed * self.refill_per_second);
        state.last_refill = now;
    }

    /// Take `n` tokens without waiting; false when not enough are available
    pub fn try_acquire(&self, n: u32) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens >= f64::from(n) {
            state.tokens -= f64::from(n);
            true
        } else {
            false
        }
    }

    /// Take `n` tokens, suspending until they become available.
    ///
    /// The wait is computed from the refill rate and re-checked after each
    /// sleep, since concurrent callers may have drained the bucket in the
    /// meantime. Returns [`RetryError::Cancelled`] if the token fires while
    /// waiting; the lock is never held across a suspension point.
    pub async fn acquire(&self, n: u32, cancel: &CancellationToken) -> Result<(), RetryError> {
        let needed = f64::from(n);
        loop {
            if cancel.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            let wait = {
                let mut state = self.state.lock();
                self.refill(&mut state);
                if state.tokens >= needed {
                    state.tokens -= needed;
                    return Ok(());
                }
                Duration::from_secs_f64((needed - state.tokens) / self.refill_per_second)
            };

            tokio::select! {
                _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
