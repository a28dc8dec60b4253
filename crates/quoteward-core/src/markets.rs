//! Per-market orchestrators wired to their provider chains.
//!
//! | Market | Primary | Secondary | Last resort |
//! |--------|---------|-----------|-------------|
//! | FX | HG Brasil | AwesomeAPI | 5.50 |
//! | Crypto | CoinMarketCap | CoinGecko | BTC at 98 000 USD x 6.00 |
//! | Indices | BCB SGS | none | CDI/SELIC 0.045, IPCA 0.40 |
//! | Stocks, REITs, ETFs | brapi | none | empty |

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::adapters::{
    AwesomeApiAdapter, BcbAdapter, BrapiAdapter, CoinGeckoAdapter, CoinMarketCapAdapter,
    HgBrasilAdapter, UsdBrlRate, ETF_TICKERS, REIT_TICKERS, STOCK_TICKERS,
};
use crate::board::{QuoteBoard, QuoteBoardSource};
use crate::http_client::{HttpClient, NoopHttpClient, ReqwestHttpClient};
use crate::orchestrator::{Quoted, SourceOrchestrator};
use crate::pacing::ProviderPacer;
use crate::retry::RetryConfig;
use crate::scheduler::Scheduler;
use crate::{
    CoinQuote, EquityQuote, FxRate, IndexRates, Market, QuotewardConfig, Ticker, YieldIndex,
};

pub type FxSource = SourceOrchestrator<FxRate>;
pub type CryptoSource = SourceOrchestrator<Vec<CoinQuote>>;
pub type IndexSource = SourceOrchestrator<IndexRates>;
pub type EquitySource = SourceOrchestrator<Vec<EquityQuote>>;

/// Payload of one market read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuotePayload {
    Fx(FxRate),
    Crypto(Vec<CoinQuote>),
    Indices(IndexRates),
    Equities(Vec<EquityQuote>),
}

/// Every market orchestrator of the process.
#[derive(Clone)]
pub struct MarketHub {
    fx: Arc<FxSource>,
    crypto: Arc<CryptoSource>,
    indices: Arc<IndexSource>,
    stocks: Arc<EquitySource>,
    reits: Arc<EquitySource>,
    etfs: Arc<EquitySource>,
}

impl MarketHub {
    pub fn builder(config: QuotewardConfig) -> MarketHubBuilder {
        MarketHubBuilder::new(config)
    }

    pub fn fx(&self) -> &Arc<FxSource> {
        &self.fx
    }

    pub fn crypto(&self) -> &Arc<CryptoSource> {
        &self.crypto
    }

    pub fn indices(&self) -> &Arc<IndexSource> {
        &self.indices
    }

    /// Basket orchestrator; `None` for non-equity markets.
    pub fn equities(&self, market: Market) -> Option<&Arc<EquitySource>> {
        match market {
            Market::Stocks => Some(&self.stocks),
            Market::Reits => Some(&self.reits),
            Market::Etfs => Some(&self.etfs),
            Market::Fx | Market::Crypto | Market::Indices => None,
        }
    }

    /// Foreground read of one market. Never fails.
    pub async fn latest_quote(&self, market: Market) -> Quoted<QuotePayload> {
        match market {
            Market::Fx => self.fx.latest().await.map(QuotePayload::Fx),
            Market::Crypto => self.crypto.latest().await.map(QuotePayload::Crypto),
            Market::Indices => self.indices.latest().await.map(QuotePayload::Indices),
            Market::Stocks => self.stocks.latest().await.map(QuotePayload::Equities),
            Market::Reits => self.reits.latest().await.map(QuotePayload::Equities),
            Market::Etfs => self.etfs.latest().await.map(QuotePayload::Equities),
        }
    }

    /// Unconditional refresh cycle of one market.
    pub async fn refresh(&self, market: Market) -> Quoted<QuotePayload> {
        match market {
            Market::Fx => self.fx.refresh().await.map(QuotePayload::Fx),
            Market::Crypto => self.crypto.refresh().await.map(QuotePayload::Crypto),
            Market::Indices => self.indices.refresh().await.map(QuotePayload::Indices),
            Market::Stocks => self.stocks.refresh().await.map(QuotePayload::Equities),
            Market::Reits => self.reits.refresh().await.map(QuotePayload::Equities),
            Market::Etfs => self.etfs.refresh().await.map(QuotePayload::Equities),
        }
    }

    /// Amount `balance` earns in one business day at the current index rates.
    pub async fn daily_yield(&self, balance: Decimal, percent: Decimal, index: YieldIndex) -> Decimal {
        let rates = self.indices.latest().await.data;
        rates.daily_yield(balance, percent, index)
    }

    /// Register one recurring refresh per market, each on its freshness window.
    pub fn schedule_refreshes(&self, scheduler: &mut Scheduler) {
        for market in Market::ALL {
            let period = match market {
                Market::Fx => self.fx.freshness(),
                Market::Crypto => self.crypto.freshness(),
                Market::Indices => self.indices.freshness(),
                Market::Stocks | Market::Reits | Market::Etfs => self.stocks.freshness(),
            };
            let hub = self.clone();
            scheduler.spawn_every(format!("refresh:{market}"), period, move || {
                let hub = hub.clone();
                async move {
                    let read = hub.refresh(market).await;
                    tracing::info!(%market, origin = read.origin.as_str(), "scheduled refresh finished");
                }
            });
        }
    }

    /// Board built from published snapshots only.
    pub async fn cached_board(&self) -> QuoteBoard {
        let rate = self
            .fx
            .snapshot()
            .await
            .map(|quoted| quoted.data)
            .unwrap_or_else(FxRate::last_resort);

        let mut equities = Vec::new();
        for source in [&self.stocks, &self.reits, &self.etfs] {
            if let Some(snapshot) = source.snapshot().await {
                equities.extend(snapshot.data);
            }
        }
        let coins = self
            .crypto
            .snapshot()
            .await
            .map(|quoted| quoted.data)
            .unwrap_or_default();

        QuoteBoard::build(rate, &equities, &coins)
    }
}

impl QuoteBoardSource for MarketHub {
    fn quote_board<'a>(&'a self) -> Pin<Box<dyn Future<Output = QuoteBoard> + Send + 'a>> {
        Box::pin(self.cached_board())
    }
}

/// Builds a [`MarketHub`] from configuration.
pub struct MarketHubBuilder {
    config: QuotewardConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    offline: bool,
}

impl MarketHubBuilder {
    pub fn new(config: QuotewardConfig) -> Self {
        Self {
            config,
            http_client: None,
            offline: false,
        }
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// No network: every provider fails fast and reads serve last-resort values.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn build(self) -> MarketHub {
        let mut config = self.config;
        let http_client: Arc<dyn HttpClient> = match (self.offline, self.http_client) {
            (true, _) => Arc::new(NoopHttpClient),
            (false, Some(client)) => client,
            (false, None) => Arc::new(ReqwestHttpClient::new()),
        };
        if self.offline {
            for source in [
                &mut config.fx,
                &mut config.crypto,
                &mut config.indices,
                &mut config.equities,
            ] {
                source.retry = RetryConfig::no_retry();
            }
            config.brapi_pacing = std::time::Duration::ZERO;
        }

        let endpoints = &config.endpoints;
        let credentials = &config.credentials;

        let fx = Arc::new(
            FxSource::new(
                "fx",
                config.fx.clone(),
                Arc::new(
                    HgBrasilAdapter::new(Arc::clone(&http_client), &credentials.hgbrasil_key)
                        .with_base_url(&endpoints.hgbrasil),
                ),
                FxRate::last_resort(),
            )
            .with_secondary(Arc::new(
                AwesomeApiAdapter::new(Arc::clone(&http_client)).with_url(&endpoints.awesomeapi),
            )),
        );

        let rate: Arc<dyn UsdBrlRate> = fx.clone();
        let crypto = Arc::new(
            CryptoSource::new(
                "crypto",
                config.crypto.clone(),
                Arc::new(
                    CoinMarketCapAdapter::new(
                        Arc::clone(&http_client),
                        Arc::clone(&rate),
                        &credentials.coinmarketcap_key,
                    )
                    .with_url(&endpoints.coinmarketcap),
                ),
                CoinQuote::last_resort(),
            )
            .with_secondary(Arc::new(
                CoinGeckoAdapter::new(Arc::clone(&http_client), rate).with_url(&endpoints.coingecko),
            )),
        );

        let indices = Arc::new(IndexSource::new(
            "indices",
            config.indices.clone(),
            Arc::new(BcbAdapter::new(Arc::clone(&http_client)).with_url_template(&endpoints.bcb)),
            IndexRates::last_resort(),
        ));

        let pacer = ProviderPacer::new(config.brapi_pacing);
        let basket = |label: &'static str, tickers: &[&str]| {
            let tickers = tickers
                .iter()
                .filter_map(|raw| Ticker::parse(raw).ok())
                .collect::<Vec<_>>();
            let adapter = BrapiAdapter::new(
                Arc::clone(&http_client),
                tickers,
                pacer.clone(),
                &credentials.brapi_token,
            )
            .with_url_template(&endpoints.brapi);
            Arc::new(EquitySource::new(
                label,
                config.equities.clone(),
                Arc::new(adapter),
                Vec::new(),
            ))
        };

        MarketHub {
            stocks: basket("stocks", &STOCK_TICKERS),
            reits: basket("reits", &REIT_TICKERS),
            etfs: basket("etfs", &ETF_TICKERS),
            fx,
            crypto,
            indices,
        }
    }
}
