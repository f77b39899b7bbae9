//! Pacing for outbound model calls.
//!
//! Batches are generated strictly in sequence and each one waits for a permit
//! before calling the provider. The bucket refills on the tokio clock, so a
//! paused runtime advances through the waits instantly in tests.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Waits until one call may proceed.
    async fn acquire(&self);
}

/// Never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unthrottled;

#[async_trait]
impl RateLimiter for Unthrottled {
    async fn acquire(&self) {}
}

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Token bucket holding up to `capacity` permits, one added every `refill_every`.
/// Starts full.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    refill_every: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_every: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            refill_every,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// One call per `interval`; the first call goes through immediately.
    pub fn per_interval(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        let earned = elapsed.as_nanos() / self.refill_every.as_nanos();
        if earned == 0 {
            return;
        }

        let missing = self.capacity - state.tokens;
        if earned >= u128::from(missing) {
            state.tokens = self.capacity;
            state.last_refill = now;
        } else {
            // earned < missing <= capacity, so it fits in u32.
            let earned = earned as u32;
            state.tokens += earned;
            state.last_refill += self.refill_every * earned;
        }
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn acquire(&self) {
        if self.refill_every.is_zero() {
            return;
        }

        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                self.refill(&mut state, now);
                if state.tokens > 0 {
                    state.tokens -= 1;
                    return;
                }
                match state.last_refill.checked_add(self.refill_every) {
                    Some(next) => next.saturating_duration_since(now),
                    // Past the clock's range: sleep as long as tokio allows.
                    None => self.refill_every,
                }
            };

            debug!(wait_ms = wait.as_millis() as u64, "Waiting for rate limit permit");
            tokio::time::sleep(wait).await;
        }
    }
}
