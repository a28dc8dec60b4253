//! # Quoteward Core
//!
//! Resilient market quotes for a personal-finance backend: FX, crypto,
//! reference interest rates and Brazilian equities, served from an in-memory
//! cache that background refreshes keep warm.
//!
//! ## Overview
//!
//! - **Canonical domain models** with `Decimal` prices and validated tickers
//! - **Provider adapters** for HG Brasil, AwesomeAPI, CoinMarketCap, CoinGecko, BCB and brapi
//! - **Source orchestration**: cache, retry, circuit breaker, secondary provider, stale and last-resort values
//! - **Token-bucket rate limiting** keyed by action and client identifier
//! - **Price alerts** evaluated against cached quotes only
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters and ticker baskets |
//! | [`alerts`] | Alert engine, repository and notifier seams |
//! | [`board`] | Unified ticker to dual-currency price lookup |
//! | [`cache`] | Single-slot TTL cache |
//! | [`circuit_breaker`] | Time-based breaker guarding primary providers |
//! | [`config`] | Defaults and `QUOTEWARD_*` environment overrides |
//! | [`domain`] | Quote types, tickers and timestamps |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`markets`] | Per-market orchestrators and their builder |
//! | [`orchestrator`] | Fallback chain for one quote source |
//! | [`pacing`] | Minimum spacing between requests to one provider |
//! | [`provider`] | Provider trait and structured errors |
//! | [`rate_limit`] | Keyed token buckets with idle sweeping |
//! | [`retry`] | Bounded retry with backoff |
//! | [`scheduler`] | Named periodic background tasks |
//! | [`source`] | Provider and market identifiers |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │  Scheduler   │   │ CLI / caller │
//! └──────┬───────┘   └──────┬───────┘
//!        │ refresh()        │ latest()
//!        ▼                  ▼
//! ┌──────────────────────────────────┐     ┌──────────────┐
//! │       SourceOrchestrator         │────▶│  QuoteCache  │
//! └──────┬──────────────────┬────────┘     └──────────────┘
//!        │ primary          │ secondary
//!        ▼                  ▼
//! ┌────────────────┐ ┌──────────────┐
//! │ Retry +        │ │ single call  │
//! │ CircuitBreaker │ │ with timeout │
//! └──────┬─────────┘ └──────┬───────┘
//!        ▼                  ▼
//! ┌──────────────────────────────────┐
//! │ QuoteProvider adapters / HTTP    │
//! └──────────────────────────────────┘
//! ```
//!
//! Foreground reads never fail: when every provider is down they return the
//! last published value, or a fixed last-resort value when nothing was ever
//! published.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quoteward_core::{Market, MarketHub, QuotewardConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quoteward_core::CoreError> {
//!     let hub = MarketHub::builder(QuotewardConfig::from_env()?).build();
//!     let fx = hub.latest_quote(Market::Fx).await;
//!     println!("{} via {}", serde_json::to_string(&fx.data)?, fx.origin.as_str());
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from the environment and never logged
//! - Provider requests use TLS via rustls

pub mod adapters;
pub mod alerts;
pub mod board;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod markets;
pub mod orchestrator;
pub mod pacing;
pub mod provider;
pub mod rate_limit;
pub mod retry;
pub mod scheduler;
pub mod source;

// Adapter implementations
pub use adapters::{
    AwesomeApiAdapter, BcbAdapter, BrapiAdapter, CoinGeckoAdapter, CoinMarketCapAdapter,
    FixedUsdBrl, HgBrasilAdapter, UsdBrlRate,
};

// Alerts
pub use alerts::{
    AlertEngine, AlertError, AlertPolicy, AlertRepository, InMemoryAlertRepository, NewAlert,
    Notifier,
};

pub use board::{QuoteBoard, QuoteBoardSource};

// Caching and resilience
pub use cache::{CacheEntry, CacheMode, QuoteCache};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use pacing::ProviderPacer;
pub use retry::{execute_with_retry, Backoff, RetryConfig, RetryExhausted};

pub use config::{ProviderCredentials, ProviderEndpoints, QuotewardConfig};

// Domain models
pub use domain::{
    decimal_from_f64, parse_decimal, parse_ticker_list, round_money, CoinQuote, Currency,
    DualQuote, EquityQuote, FxRate, IndexRates, Ticker, UtcDateTime, YieldIndex,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

pub use markets::{MarketHub, MarketHubBuilder, QuotePayload};

// Orchestration
pub use orchestrator::{OrchestratorConfig, QuoteOrigin, Quoted, SourceOrchestrator};
pub use provider::{ProviderFuture, QuoteProvider, SourceError, SourceErrorKind};

pub use rate_limit::{
    BucketSweep, RateLimitRule, RateLimited, RateLimiterConfig, TokenBucketLimiter,
};
pub use scheduler::Scheduler;

// Source identifiers
pub use source::{Market, ProviderId};
