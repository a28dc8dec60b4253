use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
}

/// Failure threshold and cooldown window of a primary provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    last_failure_at: Option<Instant>,
    consecutive_failures: u32,
}

/// Time-windowed breaker guarding a primary provider.
///
/// Once `failure_threshold` consecutive failures are recorded the breaker
/// stays open for `cooldown`; afterwards the primary is attempted again
/// without a half-open trial call.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    pub fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_open(&self) -> bool {
        let state = self.lock();
        state
            .last_failure_at
            .is_some_and(|at| Instant::now().saturating_duration_since(at) < self.config.cooldown)
    }

    pub fn state(&self) -> CircuitState {
        if self.is_open() {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    pub fn record_success(&self) {
        let mut state = self.lock();
        if state.consecutive_failures > 0 {
            tracing::info!(breaker = self.name, "primary recovered, breaker reset");
        }
        *state = BreakerState::default();
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);

        if state.consecutive_failures >= self.config.failure_threshold {
            state.last_failure_at = Some(Instant::now());
            tracing::warn!(
                breaker = self.name,
                failures = state.consecutive_failures,
                cooldown_secs = self.config.cooldown.as_secs(),
                "breaker open, primary suspended"
            );
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }
}
