use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::UsdBrlRate;
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{decode_json, ProviderFuture, QuoteProvider, SourceError};
use crate::{decimal_from_f64, CoinQuote, FxRate, ProviderId, Ticker};

pub const DEFAULT_COINMARKETCAP_URL: &str =
    "https://pro-api.coinmarketcap.com/v1/cryptocurrency/quotes/latest";

/// Top ten assets, in display order.
pub const TOP_CRYPTO_SYMBOLS: [&str; 10] = [
    "BTC", "ETH", "XRP", "BNB", "SOL", "USDC", "TRX", "DOGE", "ADA", "USDT",
];

/// CoinMarketCap latest quotes for [`TOP_CRYPTO_SYMBOLS`].
#[derive(Clone)]
pub struct CoinMarketCapAdapter {
    http_client: Arc<dyn HttpClient>,
    rate: Arc<dyn UsdBrlRate>,
    url: String,
    api_key: String,
    timeout: Duration,
}

impl CoinMarketCapAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        rate: Arc<dyn UsdBrlRate>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            rate,
            url: String::from(DEFAULT_COINMARKETCAP_URL),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}?symbol={}&convert=USD", self.url, TOP_CRYPTO_SYMBOLS.join(","))
    }

    async fn fetch_coins(&self) -> Result<Vec<CoinQuote>, SourceError> {
        let request = HttpRequest::get(self.endpoint())
            .with_header("X-CMC_PRO_API_KEY", &self.api_key)
            .with_header("Accept", "application/json")
            .with_timeout(self.timeout);
        let response = self.http_client.execute(request).await?;
        let wire: CmcResponse = decode_json(ProviderId::Coinmarketcap, &response)?;

        let rate = self.rate.usd_brl().await;
        normalize(wire, rate)
    }
}

impl QuoteProvider<Vec<CoinQuote>> for CoinMarketCapAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coinmarketcap
    }

    fn fetch<'a>(&'a self) -> ProviderFuture<'a, Vec<CoinQuote>> {
        Box::pin(self.fetch_coins())
    }
}

fn normalize(wire: CmcResponse, rate: FxRate) -> Result<Vec<CoinQuote>, SourceError> {
    let mut data = wire
        .data
        .ok_or_else(|| SourceError::invalid_response("coinmarketcap payload has no data"))?;

    let mut coins = Vec::with_capacity(TOP_CRYPTO_SYMBOLS.len());
    for symbol in TOP_CRYPTO_SYMBOLS {
        let Some(coin) = data.remove(symbol) else {
            continue;
        };
        let Some(price) = coin.quote.usd.and_then(|usd| usd.price) else {
            tracing::debug!(symbol, "coinmarketcap coin without USD price skipped");
            continue;
        };
        let ticker = Ticker::parse(coin.symbol.as_deref().unwrap_or(symbol))?;
        let price_usd = decimal_from_f64("quote.USD.price", price)?;
        coins.push(CoinQuote::priced(ticker, coin.name, price_usd, rate));
    }

    if coins.is_empty() {
        return Err(SourceError::invalid_response(
            "coinmarketcap payload contains none of the tracked symbols",
        ));
    }
    Ok(coins)
}

#[derive(Debug, Deserialize)]
struct CmcResponse {
    #[serde(default)]
    data: Option<HashMap<String, CmcCoin>>,
}

#[derive(Debug, Deserialize)]
struct CmcCoin {
    #[serde(default)]
    symbol: Option<String>,
    name: String,
    quote: CmcQuote,
}

#[derive(Debug, Deserialize)]
struct CmcQuote {
    #[serde(rename = "USD", default)]
    usd: Option<CmcUsd>,
}

#[derive(Debug, Deserialize)]
struct CmcUsd {
    #[serde(default)]
    price: Option<f64>,
}
