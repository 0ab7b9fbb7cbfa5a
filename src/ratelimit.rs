//! Outbound rate limiting.
//!
//! Implements a token bucket shared by every send path of one connection.
//!
//! - Tokens accumulate at `capacity / window` per second, up to `capacity`
//! - Each outbound line costs one token
//! - When the bucket is short, [`TokenBucket::acquire`] sleeps until the
//!   missing tokens have accumulated instead of rejecting the send
//!
//! The refill/deduct sequence runs under an async mutex that stays held
//! across the sleep, so concurrent callers queue behind each other and can
//! never observe a stale balance.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::LimiterError;

/// Mutable part of the bucket. Only touched while the mutex is held.
#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant, rate: f64, capacity: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_refill = now;
    }
}

/// Token bucket limiter for outbound lines.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_second: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a bucket holding `capacity` tokens that refills completely
    /// over `window`. The bucket starts full.
    pub fn new(capacity: u32, window: Duration) -> Result<Self, LimiterError> {
        let capacity = f64::from(capacity);
        let window = window.as_secs_f64();
        if window <= 0.0 {
            return Err(LimiterError::InvalidRefillRate(0.0));
        }
        Self::with_rate(capacity, capacity / window)
    }

    /// Create a bucket from an explicit capacity and refill rate.
    pub fn with_rate(capacity: f64, refill_per_second: f64) -> Result<Self, LimiterError> {
        if !(capacity > 0.0) {
            return Err(LimiterError::InvalidCapacity(capacity));
        }
        if !(refill_per_second > 0.0) {
            return Err(LimiterError::InvalidRefillRate(refill_per_second));
        }

        Ok(Self {
            capacity,
            refill_per_second,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        })
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_per_second(&self) -> f64 {
        self.refill_per_second
    }

    /// Current balance after crediting the time elapsed since the last
    /// refill.
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        state.refill(Instant::now(), self.refill_per_second, self.capacity);
        state.tokens
    }

    /// Wait until `n` tokens are available, then spend them.
    ///
    /// Returns how long the call slept. Asking for more than the capacity
    /// could never complete and is rejected up front.
    pub async fn acquire(&self, n: u32) -> Result<Duration, LimiterError> {
        let requested = f64::from(n);
        if requested > self.capacity {
            return Err(LimiterError::ExceedsCapacity {
                requested: n,
                capacity: self.capacity,
            });
        }

        let mut state = self.state.lock().await;
        state.refill(Instant::now(), self.refill_per_second, self.capacity);

        if state.tokens >= requested {
            state.tokens -= requested;
            return Ok(Duration::ZERO);
        }

        let missing = requested - state.tokens;
        let wait = Duration::from_nanos((missing / self.refill_per_second * 1e9).ceil() as u64);
        debug!(
            tokens = state.tokens,
            wait_ms = wait.as_millis() as u64,
            "hit rate limit"
        );

        tokio::time::sleep(wait).await;

        // The sleep covered exactly the missing tokens. Restart the refill
        // clock at wake-up so the slept interval is not credited again.
        state.tokens = 0.0;
        state.last_refill = Instant::now();

        Ok(wait)
    }
}
