use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces a minimum pause between consecutive requests to one provider.
///
/// Clones share the same budget, so every basket fetched from the same
/// provider is paced together.
#[derive(Clone)]
pub struct ProviderPacer {
    limiter: Option<Arc<DirectRateLimiter>>,
    interval: Duration,
}

impl ProviderPacer {
    /// One request per `interval`; a zero interval disables pacing.
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { limiter, interval }
    }

    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request may be sent.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Take the slot without waiting; `false` when a request was sent too recently.
    pub fn try_ready(&self) -> bool {
        self.limiter
            .as_ref()
            .map_or(true, |limiter| limiter.check().is_ok())
    }
}

impl std::fmt::Debug for ProviderPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderPacer")
            .field("interval", &self.interval)
            .finish()
    }
}
