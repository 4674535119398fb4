//! Token bucket rate limiter shared by every outbound indexer call
//!
//! The limiter is cheap to clone; clones share one bucket, so any number of
//! callers together stay under the configured request rate.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::MIN_REQUESTS_PER_SECOND;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Shared token bucket
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Maximum tokens (burst size)
    capacity: f64,
    /// Token refill rate (tokens per second)
    refill_rate: f64,
    bucket: Arc<Mutex<Bucket>>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_second` with bursts up to `burst`
    ///
    /// Rates below [`MIN_REQUESTS_PER_SECOND`] are raised to it.
    pub fn new(requests_per_second: f64, burst: u32) -> Self {
        let capacity = burst.max(1) as f64;
        Self {
            capacity,
            refill_rate: requests_per_second.max(MIN_REQUESTS_PER_SECOND),
            bucket: Arc::new(Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            })),
        }
    }

    /// Wait until a token is available, then take it
    ///
    /// The bucket lock is held while sleeping so waiters are served one at a time.
    pub async fn acquire(&self) {
        let mut bucket = self.bucket.lock().await;
        self.refill(&mut bucket);

        if bucket.tokens < 1.0 {
            let deficit = 1.0 - bucket.tokens;
            let wait = Duration::from_secs_f64(deficit / self.refill_rate);
            debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
            self.refill(&mut bucket);
        }

        bucket.tokens = (bucket.tokens - 1.0).max(0.0);
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.capacity);
        bucket.last_refill = now;
    }
}
