use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest};
use crate::pacing::ProviderPacer;
use crate::provider::{decode_json, ProviderFuture, QuoteProvider, SourceError};
use crate::{decimal_from_f64, EquityQuote, ProviderId, Ticker};

/// `{tickers}` and `{token}` are substituted per request.
pub const DEFAULT_BRAPI_URL: &str = "https://brapi.dev/api/quote/{tickers}?token={token}";

pub const STOCK_TICKERS: [&str; 10] = [
    "PETR4", "VALE3", "ITUB4", "BBDC4", "BBAS3", "WEGE3", "RENT3", "BPAC11", "SUZB3", "PRIO3",
];

pub const REIT_TICKERS: [&str; 10] = [
    "MXRF11", "HGLG11", "KNRI11", "XPLG11", "VISC11", "HCTR11", "IRDM11", "BTLG11", "XPML11",
    "VGHF11",
];

pub const ETF_TICKERS: [&str; 7] = [
    "BOVA11", "SMAL11", "IVVB11", "NASD11", "HASH11", "XINA11", "GOLD11",
];

/// brapi quote API for one basket of tickers.
///
/// Tickers are requested one at a time through a shared [`ProviderPacer`];
/// a failing ticker is skipped and only an entirely empty batch is an error.
#[derive(Clone)]
pub struct BrapiAdapter {
    http_client: Arc<dyn HttpClient>,
    tickers: Vec<Ticker>,
    pacer: ProviderPacer,
    url_template: String,
    token: String,
    timeout: Duration,
}

impl BrapiAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tickers: Vec<Ticker>,
        pacer: ProviderPacer,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            tickers,
            pacer,
            url_template: String::from(DEFAULT_BRAPI_URL),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_url_template(mut self, url_template: impl Into<String>) -> Self {
        self.url_template = url_template.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    fn endpoint(&self, ticker: &Ticker) -> String {
        self.url_template
            .replace("{tickers}", ticker.as_str())
            .replace("{token}", &urlencoding::encode(&self.token))
    }

    async fn fetch_one(&self, ticker: &Ticker) -> Result<EquityQuote, SourceError> {
        let request = HttpRequest::get(self.endpoint(ticker)).with_timeout(self.timeout);
        let response = self.http_client.execute(request).await?;
        let wire: BrapiResponse = decode_json(ProviderId::Brapi, &response)?;

        let result = wire
            .results
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::invalid_response(format!("brapi has no result for {ticker}")))?;
        normalize(result, ticker)
    }

    async fn fetch_basket(&self) -> Result<Vec<EquityQuote>, SourceError> {
        let mut quotes = Vec::with_capacity(self.tickers.len());

        for ticker in &self.tickers {
            self.pacer.ready().await;
            match self.fetch_one(ticker).await {
                Ok(quote) => quotes.push(quote),
                Err(error) => {
                    tracing::warn!(%ticker, %error, "brapi ticker failed, skipping");
                }
            }
        }

        if quotes.is_empty() {
            return Err(SourceError::unavailable(format!(
                "brapi returned no quotes for {} ticker(s)",
                self.tickers.len()
            )));
        }
        Ok(quotes)
    }
}

impl QuoteProvider<Vec<EquityQuote>> for BrapiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Brapi
    }

    fn fetch<'a>(&'a self) -> ProviderFuture<'a, Vec<EquityQuote>> {
        Box::pin(self.fetch_basket())
    }
}

fn normalize(result: BrapiResult, requested: &Ticker) -> Result<EquityQuote, SourceError> {
    let price = result
        .regular_market_price
        .ok_or_else(|| SourceError::invalid_response(format!("brapi has no price for {requested}")))?;

    let ticker = match result.symbol.as_deref() {
        Some(symbol) => Ticker::parse(symbol)?,
        None => requested.clone(),
    };
    let change_percent = result
        .regular_market_change_percent
        .map(|value| decimal_from_f64("regularMarketChangePercent", value))
        .transpose()?;

    Ok(EquityQuote {
        ticker,
        name: result.long_name,
        price_brl: decimal_from_f64("regularMarketPrice", price)?,
        change_percent,
        logo_url: result.logourl,
    })
}

#[derive(Debug, Deserialize)]
struct BrapiResponse {
    #[serde(default)]
    results: Vec<BrapiResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrapiResult {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    regular_market_change_percent: Option<f64>,
    #[serde(default)]
    logourl: Option<String>,
}
