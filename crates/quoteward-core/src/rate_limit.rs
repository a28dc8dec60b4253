//! Per-key token buckets with idle-bucket garbage collection.
//!
//! Buckets are created lazily on first use with `capacity` tokens and are
//! topped back up to full at every whole `refill_period` since creation.
//! The first settings seen for a key stick until the bucket is evicted.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use thiserror::Error;
use tokio::time::Instant;

/// Request rejected because the key's bucket is empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("too many attempts for '{key}', retry in {}s", .retry_after.as_secs().max(1))]
pub struct RateLimited {
    pub key: String,
    pub retry_after: Duration,
}

/// Named quota applied to keys of the form `prefix:identifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub prefix: &'static str,
    pub capacity: u32,
    pub refill_period: Duration,
}

impl RateLimitRule {
    pub const LOGIN: Self = Self::new("login", 5, 3600);
    pub const REGISTER: Self = Self::new("register", 3, 3600);
    pub const RESEND_EMAIL: Self = Self::new("resend-email", 3, 3600);
    pub const FORGOT_PASSWORD: Self = Self::new("forgot", 3, 3600);
    pub const IP: Self = Self::new("ip", 10, 60);
    pub const AI_ANALYSIS: Self = Self::new("ai_analysis", 1, 1000);

    pub const ALL: [Self; 6] = [
        Self::LOGIN,
        Self::REGISTER,
        Self::RESEND_EMAIL,
        Self::FORGOT_PASSWORD,
        Self::IP,
        Self::AI_ANALYSIS,
    ];

    const fn new(prefix: &'static str, capacity: u32, refill_secs: u64) -> Self {
        Self {
            prefix,
            capacity,
            refill_period: Duration::from_secs(refill_secs),
        }
    }

    pub fn key(&self, identifier: &str) -> String {
        format!("{}:{}", self.prefix, identifier.trim().to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Buckets untouched for this long are evicted by [`TokenBucketLimiter::sweep`].
    pub idle_ttl: Duration,
    /// Above this many buckets a sweep clears the whole table.
    pub max_buckets: usize,
    pub sweep_period: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_buckets: 10_000,
            sweep_period: Duration::from_secs(40 * 60),
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_period: Duration,
    /// Start of the current refill period.
    period_start: Instant,
    last_access: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, refill_period: Duration, now: Instant) -> Self {
        Self {
            tokens: f64::from(capacity),
            capacity: f64::from(capacity),
            refill_period: refill_period.max(Duration::from_millis(1)),
            period_start: now,
            last_access: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.period_start);
        let periods = elapsed.as_nanos() / self.refill_period.as_nanos();
        if periods > 0 {
            self.tokens = self.capacity;
            let advance = self.refill_period.saturating_mul(u32::try_from(periods).unwrap_or(u32::MAX));
            self.period_start += advance;
        }
    }

    fn try_consume(&mut self, now: Instant) -> Result<(), Duration> {
        self.refill(now);
        self.last_access = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err((self.period_start + self.refill_period).saturating_duration_since(now))
        }
    }
}

/// Outcome of one [`TokenBucketLimiter::sweep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketSweep {
    pub evicted: usize,
    /// The table exceeded its ceiling and was cleared.
    pub reset: bool,
    pub remaining: usize,
}

/// Shared per-key limiter. Clones share the same bucket table.
#[derive(Debug, Clone)]
pub struct TokenBucketLimiter {
    buckets: Arc<DashMap<String, TokenBucket>>,
    config: RateLimiterConfig,
}

impl Default for TokenBucketLimiter {
    fn default() -> Self {
        Self::new(RateLimiterConfig::default())
    }
}

impl TokenBucketLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> RateLimiterConfig {
        self.config
    }

    /// Take one token from `key`'s bucket, creating it on first use.
    pub fn consume(&self, key: &str, capacity: u32, refill_period: Duration) -> Result<(), RateLimited> {
        let now = Instant::now();
        let mut bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| TokenBucket::new(capacity, refill_period, now));

        bucket.try_consume(now).map_err(|retry_after| {
            tracing::debug!(key, retry_after_secs = retry_after.as_secs(), "rate limit hit");
            RateLimited {
                key: key.to_owned(),
                retry_after,
            }
        })
    }

    pub fn consume_rule(&self, rule: &RateLimitRule, identifier: &str) -> Result<(), RateLimited> {
        self.consume(&rule.key(identifier), rule.capacity, rule.refill_period)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Evict idle buckets; clear everything when the table is still too large.
    pub fn sweep(&self) -> BucketSweep {
        let now = Instant::now();
        let before = self.buckets.len();
        let idle_ttl = self.config.idle_ttl;

        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_access) < idle_ttl);
        let after_evict = self.buckets.len();
        let evicted = before.saturating_sub(after_evict);

        if after_evict > self.config.max_buckets {
            tracing::warn!(
                buckets = after_evict,
                ceiling = self.config.max_buckets,
                "rate limit table over ceiling, resetting"
            );
            self.buckets.clear();
            return BucketSweep {
                evicted,
                reset: true,
                remaining: 0,
            };
        }

        if evicted > 0 {
            tracing::info!(evicted, remaining = after_evict, "idle rate limit buckets evicted");
        }
        BucketSweep {
            evicted,
            reset: false,
            remaining: after_evict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_keys_are_prefixed_and_normalized() {
        assert_eq!(RateLimitRule::LOGIN.key(" Ana@Mail.com "), "login:ana@mail.com");
        assert_eq!(RateLimitRule::AI_ANALYSIS.refill_period, Duration::from_secs(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_points_to_next_refill() {
        let limiter = TokenBucketLimiter::default();
        limiter
            .consume("ip:10.0.0.1", 1, Duration::from_secs(60))
            .expect("first token");

        tokio::time::advance(Duration::from_secs(15)).await;
        let limited = limiter
            .consume("ip:10.0.0.1", 1, Duration::from_secs(60))
            .expect_err("bucket empty");
        assert_eq!(limited.retry_after, Duration::from_secs(45));
        assert!(limited.to_string().contains("retry in 45s"));
    }

    #[tokio::test(start_paused = true)]
    async fn keys_do_not_share_buckets() {
        let limiter = TokenBucketLimiter::default();
        assert!(limiter.consume_rule(&RateLimitRule::AI_ANALYSIS, "1").is_ok());
        assert!(limiter.consume_rule(&RateLimitRule::AI_ANALYSIS, "1").is_err());
        assert!(limiter.consume_rule(&RateLimitRule::AI_ANALYSIS, "2").is_ok());
        assert_eq!(limiter.len(), 2);
    }
}
