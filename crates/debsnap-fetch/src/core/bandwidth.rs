use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket algorithm implementation for bandwidth limiting.
///
/// One token is one byte. Acquiring more tokens than are available puts the
/// bucket into debt and sleeps until the debt is repaid, so a sustained
/// stream never exceeds `refill_rate` bytes per second on average. The lock is
/// held across the sleep, which makes waiters queue in arrival order.
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_refill = now;
    }
}

impl TokenBucket {
    /// Create a new TokenBucket with the specified capacity and refill rate.
    pub fn new(capacity: u64, refill_rate: u64) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate: refill_rate.max(1) as f64,
        }
    }

    /// Bucket with one second of burst at `bytes_per_second`.
    pub fn per_second(bytes_per_second: u64) -> Self {
        Self::new(bytes_per_second, bytes_per_second)
    }

    pub fn refill_rate(&self) -> u64 {
        self.refill_rate as u64
    }

    /// Acquire the specified number of tokens, waiting if necessary.
    pub async fn acquire(&self, bytes: usize) {
        let mut state = self.state.lock().await;
        state.refill(self.capacity, self.refill_rate);
        state.tokens -= bytes as f64;

        if state.tokens < 0.0 {
            let wait = Duration::from_secs_f64(-state.tokens / self.refill_rate);
            tokio::time::sleep(wait).await;
            state.refill(self.capacity, self.refill_rate);
        }
    }

    /// Take tokens only if they are available right now.
    pub fn try_acquire(&self, bytes: usize) -> bool {
        let Ok(mut state) = self.state.try_lock() else {
            return false;
        };
        state.refill(self.capacity, self.refill_rate);
        if state.tokens >= bytes as f64 {
            state.tokens -= bytes as f64;
            true
        } else {
            false
        }
    }
}
