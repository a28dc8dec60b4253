use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{decode_json, ProviderFuture, QuoteProvider, SourceError};
use crate::{decimal_from_f64, FxRate, ProviderId, ValidationError};

pub const DEFAULT_HGBRASIL_URL: &str = "https://api.hgbrasil.com/finance?format=json-cors&";

/// HG Brasil finance API, USD buy rate.
#[derive(Clone)]
pub struct HgBrasilAdapter {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl HgBrasilAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_HGBRASIL_URL),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Base URL is expected to end with `?` or `&`; the key is appended.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}key={}", self.base_url, urlencoding::encode(&self.api_key))
    }

    async fn fetch_rate(&self) -> Result<FxRate, SourceError> {
        let request = HttpRequest::get(self.endpoint()).with_timeout(self.timeout);
        let response = self.http_client.execute(request).await?;
        let wire: HgBrasilResponse = decode_json(ProviderId::Hgbrasil, &response)?;
        normalize(wire)
    }
}

impl QuoteProvider<FxRate> for HgBrasilAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Hgbrasil
    }

    fn fetch<'a>(&'a self) -> ProviderFuture<'a, FxRate> {
        Box::pin(self.fetch_rate())
    }
}

fn normalize(wire: HgBrasilResponse) -> Result<FxRate, SourceError> {
    let buy = wire
        .results
        .and_then(|results| results.currencies)
        .and_then(|currencies| currencies.usd)
        .and_then(|usd| usd.buy)
        .ok_or_else(|| SourceError::invalid_response("hgbrasil payload has no USD buy rate"))?;

    let usd_brl = decimal_from_f64("results.currencies.USD.buy", buy)?;
    if usd_brl <= rust_decimal::Decimal::ZERO {
        return Err(ValidationError::NonPositiveValue {
            field: "results.currencies.USD.buy",
        }
        .into());
    }
    Ok(FxRate::new(usd_brl))
}

#[derive(Debug, Deserialize)]
struct HgBrasilResponse {
    #[serde(default)]
    results: Option<HgBrasilResults>,
}

#[derive(Debug, Deserialize)]
struct HgBrasilResults {
    #[serde(default)]
    currencies: Option<HgBrasilCurrencies>,
}

#[derive(Debug, Deserialize)]
struct HgBrasilCurrencies {
    #[serde(rename = "USD", default)]
    usd: Option<HgBrasilCurrency>,
}

#[derive(Debug, Deserialize)]
struct HgBrasilCurrency {
    #[serde(default)]
    buy: Option<f64>,
}
