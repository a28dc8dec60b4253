//! Runtime configuration with `QUOTEWARD_*` environment overrides.

use std::str::FromStr;
use std::time::Duration;

use crate::adapters::{
    DEFAULT_AWESOMEAPI_URL, DEFAULT_BCB_URL, DEFAULT_BRAPI_URL, DEFAULT_COINGECKO_URL,
    DEFAULT_COINMARKETCAP_URL, DEFAULT_HGBRASIL_URL,
};
use crate::alerts::AlertPolicy;
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::rate_limit::RateLimiterConfig;
use crate::retry::RetryConfig;
use crate::CoreError;

const ENV_PREFIX: &str = "QUOTEWARD_";

/// Provider credentials. Empty strings are sent as-is; providers reject them
/// and reads fall back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub hgbrasil_key: String,
    pub coinmarketcap_key: String,
    pub brapi_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub hgbrasil: String,
    pub awesomeapi: String,
    pub coinmarketcap: String,
    pub coingecko: String,
    /// Contains `{code}`.
    pub bcb: String,
    /// Contains `{tickers}` and `{token}`.
    pub brapi: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            hgbrasil: String::from(DEFAULT_HGBRASIL_URL),
            awesomeapi: String::from(DEFAULT_AWESOMEAPI_URL),
            coinmarketcap: String::from(DEFAULT_COINMARKETCAP_URL),
            coingecko: String::from(DEFAULT_COINGECKO_URL),
            bcb: String::from(DEFAULT_BCB_URL),
            brapi: String::from(DEFAULT_BRAPI_URL),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct QuotewardConfig {
    pub credentials: ProviderCredentials,
    pub endpoints: ProviderEndpoints,
    pub fx: OrchestratorConfig,
    pub crypto: OrchestratorConfig,
    pub indices: OrchestratorConfig,
    /// Shared by the stock, REIT and ETF baskets.
    pub equities: OrchestratorConfig,
    /// Minimum pause between two brapi requests.
    pub brapi_pacing: Duration,
    pub alerts: AlertPolicy,
    pub rate_limiter: RateLimiterConfig,
}

impl Default for QuotewardConfig {
    fn default() -> Self {
        Self {
            credentials: ProviderCredentials::default(),
            endpoints: ProviderEndpoints::default(),
            fx: source(35 * 60, 3, 30),
            crypto: source(30 * 60, 3, 30),
            indices: source(12 * 60 * 60, 3, 60),
            equities: source(30 * 60, 2, 180),
            brapi_pacing: Duration::from_secs(2),
            alerts: AlertPolicy::default(),
            rate_limiter: RateLimiterConfig::default(),
        }
    }
}

fn source(freshness_secs: u64, attempts: u32, timeout_secs: u64) -> OrchestratorConfig {
    OrchestratorConfig {
        freshness: Duration::from_secs(freshness_secs),
        breaker: CircuitBreakerConfig::default(),
        retry: RetryConfig::attempts(attempts),
        call_timeout: Duration::from_secs(timeout_secs),
    }
}

impl QuotewardConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden through `lookup`, which receives full variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        let mut config = Self::default();

        config.credentials = ProviderCredentials {
            hgbrasil_key: env.string("HGBRASIL_KEY").unwrap_or_default(),
            coinmarketcap_key: env.string("CMC_KEY").unwrap_or_default(),
            brapi_token: env.string("BRAPI_TOKEN").unwrap_or_default(),
        };

        let endpoints = &mut config.endpoints;
        for (name, slot) in [
            ("HGBRASIL_URL", &mut endpoints.hgbrasil),
            ("AWESOMEAPI_URL", &mut endpoints.awesomeapi),
            ("CMC_URL", &mut endpoints.coinmarketcap),
            ("COINGECKO_URL", &mut endpoints.coingecko),
            ("BCB_URL", &mut endpoints.bcb),
            ("BRAPI_URL", &mut endpoints.brapi),
        ] {
            if let Some(value) = env.string(name) {
                *slot = value;
            }
        }
        if !config.endpoints.bcb.contains("{code}") {
            return Err(CoreError::Config(String::from(
                "QUOTEWARD_BCB_URL must contain the {code} placeholder",
            )));
        }
        if !config.endpoints.brapi.contains("{tickers}") {
            return Err(CoreError::Config(String::from(
                "QUOTEWARD_BRAPI_URL must contain the {tickers} placeholder",
            )));
        }

        env.apply_source("FX", &mut config.fx)?;
        env.apply_source("CRYPTO", &mut config.crypto)?;
        env.apply_source("INDICES", &mut config.indices)?;
        env.apply_source("EQUITIES", &mut config.equities)?;

        if let Some(ms) = env.parse::<u64>("BRAPI_PACING_MS")? {
            config.brapi_pacing = Duration::from_millis(ms);
        }

        if let Some(value) = env.parse::<usize>("ALERT_MAX_ACTIVE")? {
            config.alerts.max_active = value;
        }
        if let Some(secs) = env.parse::<u64>("ALERT_THROTTLE_SECS")? {
            config.alerts.creation_throttle = Duration::from_secs(secs);
        }
        if let Some(value) = env.positive::<usize>("ALERT_SWEEP_BATCH")? {
            config.alerts.sweep_batch = value;
        }
        if let Some(secs) = env.positive::<u64>("ALERT_SWEEP_SECS")? {
            config.alerts.sweep_period = Duration::from_secs(secs);
        }

        if let Some(secs) = env.positive::<u64>("LIMITER_IDLE_SECS")? {
            config.rate_limiter.idle_ttl = Duration::from_secs(secs);
        }
        if let Some(value) = env.positive::<usize>("LIMITER_MAX_BUCKETS")? {
            config.rate_limiter.max_buckets = value;
        }
        if let Some(secs) = env.positive::<u64>("LIMITER_SWEEP_SECS")? {
            config.rate_limiter.sweep_period = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{ENV_PREFIX}{name}"))
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, CoreError> {
        self.string(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    CoreError::Config(format!("{ENV_PREFIX}{name} has invalid value '{raw}'"))
                })
            })
            .transpose()
    }

    fn positive<T: FromStr + PartialOrd + Default>(&self, name: &str) -> Result<Option<T>, CoreError> {
        match self.parse::<T>(name)? {
            Some(value) if value <= T::default() => Err(CoreError::Config(format!(
                "{ENV_PREFIX}{name} must be greater than zero"
            ))),
            other => Ok(other),
        }
    }

    fn apply_source(&self, source: &str, config: &mut OrchestratorConfig) -> Result<(), CoreError> {
        if let Some(secs) = self.positive::<u64>(&format!("{source}_FRESHNESS_SECS"))? {
            config.freshness = Duration::from_secs(secs);
        }
        if let Some(attempts) = self.positive::<u32>(&format!("{source}_RETRY_ATTEMPTS"))? {
            config.retry.max_attempts = attempts;
        }
        if let Some(secs) = self.positive::<u64>(&format!("{source}_TIMEOUT_SECS"))? {
            config.call_timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = self.positive::<u32>(&format!("{source}_BREAKER_THRESHOLD"))? {
            config.breaker.failure_threshold = threshold;
        }
        if let Some(secs) = self.parse::<u64>(&format!("{source}_BREAKER_COOLDOWN_SECS"))? {
            config.breaker.cooldown = Duration::from_secs(secs);
        }
        Ok(())
    }
}
