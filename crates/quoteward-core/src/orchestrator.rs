//! Cache + breaker + retry composition shared by every market source.
//!
//! A [`SourceOrchestrator`] owns one cache slot and one circuit breaker. A
//! refresh cycle tries the primary provider (unless its breaker is open)
//! through the retry executor, falls back to the secondary provider, then to
//! the previously published snapshot and finally to a hard-coded last-resort
//! payload. Reads never fail.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CacheEntry, CacheMode, QuoteCache};
use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::provider::QuoteProvider;
use crate::retry::{execute_with_retry, RetryConfig};
use crate::{ProviderId, UtcDateTime};

/// Where the data returned by a read came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    /// Fresh snapshot, no I/O performed.
    Cache,
    Primary,
    Secondary,
    /// Every provider failed; previous snapshot served.
    Stale,
    /// Every provider failed and nothing was ever cached.
    LastResort,
}

impl QuoteOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Stale => "stale",
            Self::LastResort => "last_resort",
        }
    }
}

/// Payload plus read metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Quoted<T> {
    pub data: T,
    pub origin: QuoteOrigin,
    pub provider: Option<ProviderId>,
    pub refreshed_at: Option<UtcDateTime>,
}

impl<T> Quoted<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Quoted<U> {
        Quoted {
            data: f(self.data),
            origin: self.origin,
            provider: self.provider,
            refreshed_at: self.refreshed_at,
        }
    }
}

impl<T: Clone> Quoted<T> {
    fn from_entry(entry: &CacheEntry<Published<T>>, origin: QuoteOrigin) -> Self {
        Self {
            data: entry.payload.data.clone(),
            origin,
            provider: Some(entry.payload.provider),
            refreshed_at: Some(entry.as_of),
        }
    }
}

/// Cached payload tagged with the provider that produced it.
#[derive(Debug, Clone)]
pub struct Published<T> {
    pub data: T,
    pub provider: ProviderId,
}

/// Tunables of one orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub freshness: Duration,
    pub breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    /// Upper bound for the primary attempt (retries included) and, separately,
    /// for the secondary attempt.
    pub call_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            freshness: Duration::from_secs(30 * 60),
            breaker: CircuitBreakerConfig::default(),
            retry: RetryConfig::default(),
            call_timeout: Duration::from_secs(30),
        }
    }
}

pub struct SourceOrchestrator<T> {
    label: &'static str,
    cache: QuoteCache<Published<T>>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
    call_timeout: Duration,
    primary: Arc<dyn QuoteProvider<T>>,
    secondary: Option<Arc<dyn QuoteProvider<T>>>,
    last_resort: T,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl<T> SourceOrchestrator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(
        label: &'static str,
        config: OrchestratorConfig,
        primary: Arc<dyn QuoteProvider<T>>,
        last_resort: T,
    ) -> Self {
        Self {
            label,
            cache: QuoteCache::new(config.freshness),
            breaker: CircuitBreaker::new(label, config.breaker),
            retry: config.retry,
            call_timeout: config.call_timeout,
            primary,
            secondary: None,
            last_resort,
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn QuoteProvider<T>>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn freshness(&self) -> Duration {
        self.cache.freshness()
    }

    /// Foreground read: fresh snapshot or a synchronous refresh.
    pub async fn latest(&self) -> Quoted<T> {
        self.read(CacheMode::Use).await
    }

    /// Unconditional refresh cycle, used by the scheduler.
    pub async fn refresh(&self) -> Quoted<T> {
        self.read(CacheMode::Refresh).await
    }

    /// Currently published snapshot without any I/O.
    pub async fn snapshot(&self) -> Option<Quoted<T>> {
        let (entry, fresh) = self.cache.get().await?;
        let origin = if fresh { QuoteOrigin::Cache } else { QuoteOrigin::Stale };
        Some(Quoted::from_entry(&entry, origin))
    }

    pub async fn read(&self, mode: CacheMode) -> Quoted<T> {
        if mode == CacheMode::Use {
            if let Some((entry, true)) = self.cache.get().await {
                return Quoted::from_entry(&entry, QuoteOrigin::Cache);
            }
        }

        let _guard = match self.refresh_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                // A cycle is in flight: foreground reads keep serving the
                // published snapshot and only wait on a cold cache.
                if mode == CacheMode::Use {
                    if let Some(quoted) = self.snapshot().await {
                        return quoted;
                    }
                }
                self.refresh_lock.lock().await
            }
        };

        if mode == CacheMode::Use {
            if let Some((entry, true)) = self.cache.get().await {
                return Quoted::from_entry(&entry, QuoteOrigin::Cache);
            }
        }

        self.run_cycle().await
    }

    async fn run_cycle(&self) -> Quoted<T> {
        if self.breaker.is_open() {
            tracing::info!(source = self.label, provider = %self.primary.id(), "breaker open, skipping primary");
        } else if let Some(data) = self.try_primary().await {
            return self.publish(data, self.primary.id(), QuoteOrigin::Primary).await;
        }

        if let Some(secondary) = &self.secondary {
            match tokio::time::timeout(self.call_timeout, secondary.fetch()).await {
                Ok(Ok(data)) => {
                    return self.publish(data, secondary.id(), QuoteOrigin::Secondary).await;
                }
                Ok(Err(error)) => {
                    tracing::warn!(source = self.label, provider = %secondary.id(), error = %error, "secondary provider failed");
                }
                Err(_) => {
                    tracing::warn!(source = self.label, provider = %secondary.id(), "secondary provider timed out");
                }
            }
        }

        match self.cache.get().await {
            Some((entry, _)) => {
                tracing::warn!(source = self.label, "all providers failed, serving previous snapshot");
                Quoted::from_entry(&entry, QuoteOrigin::Stale)
            }
            None => {
                tracing::error!(source = self.label, "all providers failed and nothing cached, serving last-resort value");
                Quoted {
                    data: self.last_resort.clone(),
                    origin: QuoteOrigin::LastResort,
                    provider: None,
                    refreshed_at: None,
                }
            }
        }
    }

    async fn try_primary(&self) -> Option<T> {
        let primary = Arc::clone(&self.primary);
        let attempt = execute_with_retry(&self.retry, self.label, || primary.fetch());

        match tokio::time::timeout(self.call_timeout, attempt).await {
            Ok(Ok(data)) => {
                self.breaker.record_success();
                Some(data)
            }
            Ok(Err(exhausted)) => {
                self.breaker.record_failure();
                tracing::warn!(
                    source = self.label,
                    provider = %self.primary.id(),
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "primary provider failed, falling back"
                );
                None
            }
            Err(_) => {
                self.breaker.record_failure();
                tracing::warn!(
                    source = self.label,
                    provider = %self.primary.id(),
                    timeout_secs = self.call_timeout.as_secs(),
                    "primary provider timed out, falling back"
                );
                None
            }
        }
    }

    async fn publish(&self, data: T, provider: ProviderId, origin: QuoteOrigin) -> Quoted<T> {
        let entry = self.cache.set(Published { data, provider }).await;
        tracing::debug!(source = self.label, %provider, origin = origin.as_str(), "snapshot published");
        Quoted::from_entry(&entry, origin)
    }
}
