//! Fixed-interval request gate
//!
//! Discogs allows 60 authenticated requests per minute. The gate keeps at
//! least `min_interval` between the end of one request and the start of the
//! next, measured on an injected [`Clock`] so the spacing can be checked
//! without real waiting.

use bridge_traits::time::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::sleep;
use tracing::debug;

/// Enforces a minimum delay between two requests.
///
/// A [`RequestSlot`] is held for the whole request, so callers sharing one
/// limiter are serialised and the interval is counted from the moment the
/// previous slot was released.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    last_request_ms: Mutex<Option<i64>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last_request_ms: Mutex::new(None),
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a request issued at `now_ms` would have to wait.
    fn delay_at(&self, last_ms: Option<i64>, now_ms: i64) -> Option<Duration> {
        let last = last_ms?;
        let required_ms = i64::try_from(self.min_interval.as_millis()).unwrap_or(i64::MAX);
        let elapsed_ms = now_ms.saturating_sub(last).max(0);
        (elapsed_ms < required_ms)
            .then(|| Duration::from_millis((required_ms - elapsed_ms) as u64))
    }

    /// Wait until the next request may be issued, then claim the slot.
    ///
    /// Keep the returned slot alive until the response has arrived.
    pub async fn acquire(&self) -> RequestSlot<'_> {
        let last = self.last_request_ms.lock().await;

        if let Some(wait) = self.delay_at(*last, self.clock.unix_timestamp_millis()) {
            debug!("Rate limiting: waiting {:?}", wait);
            sleep(wait).await;
        }

        RequestSlot {
            clock: self.clock.as_ref(),
            last,
        }
    }
}

/// Exclusive right to issue one request; releasing it starts the next interval.
pub struct RequestSlot<'a> {
    clock: &'a dyn Clock,
    last: MutexGuard<'a, Option<i64>>,
}

impl Drop for RequestSlot<'_> {
    fn drop(&mut self) {
        *self.last = Some(self.clock.unix_timestamp_millis());
    }
}
