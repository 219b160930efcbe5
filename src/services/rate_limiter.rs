use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration, Instant};
use parking_lot::Mutex;

/// Paces calls to the price provider.
///
/// Alpha Vantage's free tier allows 5 requests per minute; without pacing a
/// run over more symbols than that gets throttle payloads back for the tail.
pub struct RateLimiter {
    /// Bounds concurrent in-flight requests
    semaphore: Arc<Semaphore>,
    last_request: Arc<Mutex<Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    /// # Arguments
    /// * `max_concurrent` - Maximum number of in-flight requests
    /// * `requests_per_minute` - Maximum requests started per minute
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / requests_per_minute.max(1) as u64;
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            last_request: Arc::new(Mutex::new(
                Instant::now()
                    .checked_sub(Duration::from_secs(60))
                    .unwrap_or_else(Instant::now),
            )),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Wait for a free slot and for the minimum spacing since the previous
    /// request. The slot is released when the guard is dropped.
    pub async fn acquire(&self) -> Option<RateLimitGuard> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;

        // Reserve the next start time under the lock, sleep outside it.
        let wait_time = {
            let mut last = self.last_request.lock();
            let now = Instant::now();
            let next = (*last + self.min_delay).max(now);
            *last = next;
            next - now
        };

        if !wait_time.is_zero() {
            sleep(wait_time).await;
        }

        Some(RateLimitGuard { _permit: permit })
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }
}

pub struct RateLimitGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
