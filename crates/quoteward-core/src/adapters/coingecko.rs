use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::UsdBrlRate;
use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{decode_json, ProviderFuture, QuoteProvider, SourceError};
use crate::{decimal_from_f64, CoinQuote, FxRate, ProviderId, Ticker};

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=10&page=1";

/// CoinGecko markets listing, ordered by market cap.
#[derive(Clone)]
pub struct CoinGeckoAdapter {
    http_client: Arc<dyn HttpClient>,
    rate: Arc<dyn UsdBrlRate>,
    url: String,
    timeout: Duration,
}

impl CoinGeckoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, rate: Arc<dyn UsdBrlRate>) -> Self {
        Self {
            http_client,
            rate,
            url: String::from(DEFAULT_COINGECKO_URL),
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

    async fn fetch_coins(&self) -> Result<Vec<CoinQuote>, SourceError> {
        let request = HttpRequest::get(&self.url).with_timeout(self.timeout);
        let response = self.http_client.execute(request).await?;
        let wire: Vec<GeckoMarket> = decode_json(ProviderId::Coingecko, &response)?;

        let rate = self.rate.usd_brl().await;
        normalize(wire, rate)
    }
}

impl QuoteProvider<Vec<CoinQuote>> for CoinGeckoAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coingecko
    }

    fn fetch<'a>(&'a self) -> ProviderFuture<'a, Vec<CoinQuote>> {
        Box::pin(self.fetch_coins())
    }
}

fn normalize(wire: Vec<GeckoMarket>, rate: FxRate) -> Result<Vec<CoinQuote>, SourceError> {
    let mut coins = Vec::with_capacity(wire.len());
    for market in wire {
        let Some(price) = market.current_price else {
            continue;
        };
        let ticker = match Ticker::parse(&market.symbol) {
            Ok(ticker) => ticker,
            Err(error) => {
                tracing::debug!(symbol = %market.symbol, %error, "coingecko symbol skipped");
                continue;
            }
        };
        let price_usd = decimal_from_f64("current_price", price)?;
        coins.push(CoinQuote::priced(ticker, market.name, price_usd, rate));
    }

    if coins.is_empty() {
        return Err(SourceError::invalid_response("coingecko returned no priced markets"));
    }
    Ok(coins)
}

#[derive(Debug, Deserialize)]
struct GeckoMarket {
    symbol: String,
    name: String,
    #[serde(default)]
    current_price: Option<f64>,
}
