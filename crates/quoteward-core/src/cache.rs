//! Single-slot freshness cache holding the latest snapshot of one source.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::UtcDateTime;

/// How a read treats the cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh snapshot without I/O; refresh otherwise. (Default)
    #[default]
    Use,
    /// Always run a refresh cycle, then publish its result.
    Refresh,
}

/// One published snapshot. Replaced wholesale, never mutated.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub payload: T,
    /// Monotonic instant of the refresh, used for freshness.
    pub refreshed_at: Instant,
    /// Wall clock instant of the refresh, reported to callers.
    pub as_of: UtcDateTime,
}

impl<T> CacheEntry<T> {
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.refreshed_at)
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() < window
    }
}

/// Thread-safe holder of the latest successful snapshot.
///
/// The slot is never evicted: once set it always holds the most recent
/// payload, which orchestrators fall back to when every provider fails.
#[derive(Debug)]
pub struct QuoteCache<T> {
    slot: Arc<tokio::sync::RwLock<Option<Arc<CacheEntry<T>>>>>,
    freshness: Duration,
}

impl<T> Clone for QuoteCache<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            freshness: self.freshness,
        }
    }
}

impl<T> QuoteCache<T> {
    pub fn new(freshness: Duration) -> Self {
        Self {
            slot: Arc::new(tokio::sync::RwLock::new(None)),
            freshness,
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Current snapshot and whether it is still inside the freshness window.
    pub async fn get(&self) -> Option<(Arc<CacheEntry<T>>, bool)> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .map(|entry| (Arc::clone(entry), entry.is_fresh(self.freshness)))
    }

    /// Publish a new snapshot, stamping both clocks.
    pub async fn set(&self, payload: T) -> Arc<CacheEntry<T>> {
        let entry = Arc::new(CacheEntry {
            payload,
            refreshed_at: Instant::now(),
            as_of: UtcDateTime::now(),
        });
        let mut slot = self.slot.write().await;
        *slot = Some(Arc::clone(&entry));
        entry
    }

    pub async fn is_empty(&self) -> bool {
        self.slot.read().await.is_none()
    }
}
