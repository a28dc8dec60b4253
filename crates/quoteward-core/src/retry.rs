//! Bounded retries with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    Fixed {
        delay: Duration,
    },
    /// `base * factor^attempt`, capped at `max`, attempt counted from 1.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        /// Spread the delay +/- 50%.
        jitter: bool,
    },
}

impl Default for Backoff {
    /// Waits `2^attempt` seconds: 2 s after the first failure, 4 s after the
    /// second. Capped at one day so huge attempt counts stay representable.
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(24 * 60 * 60),
            jitter: false,
        }
    }
}

impl Backoff {
    /// Delay to wait after the failed `attempt` (1-based).
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let seconds = (base.as_secs_f64() * factor.powi(exponent)).min(max.as_secs_f64());
                let mut delay = Duration::from_secs_f64(seconds.max(0.0));

                if jitter {
                    let spread = (delay.as_millis() / 2) as u64;
                    let offset = fastrand::u64(0..=spread * 2);
                    let total = (delay.as_millis() as u64 + offset).saturating_sub(spread);
                    delay = Duration::from_millis(total);
                }

                delay
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn fixed(delay: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed { delay },
        }
    }

    /// Single attempt, no waiting.
    pub fn no_retry() -> Self {
        Self::fixed(Duration::ZERO, 1)
    }
}

/// Every attempt failed; carries the last error.
#[derive(Debug, Error)]
#[error("{label}: gave up after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted<E: std::fmt::Debug + Display> {
    pub label: String,
    pub attempts: u32,
    pub last_error: E,
}

/// Run `op` until it succeeds or `max_attempts` attempts have failed.
///
/// The wait between attempts is a tokio sleep, so dropping the returned
/// future cancels it.
pub async fn execute_with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    label: &str,
    mut op: F,
) -> Result<T, RetryExhausted<E>>
where
    E: std::fmt::Debug + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt >= max_attempts => {
                tracing::error!(label, attempts = attempt, error = %error, "all retry attempts failed");
                return Err(RetryExhausted {
                    label: label.to_owned(),
                    attempts: attempt,
                    last_error: error,
                });
            }
            Err(error) => {
                let delay = config.backoff.delay(attempt);
                tracing::warn!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
