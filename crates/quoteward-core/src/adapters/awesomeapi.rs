use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{decode_json, ProviderFuture, QuoteProvider, SourceError};
use crate::{parse_decimal, FxRate, ProviderId, ValidationError};

pub const DEFAULT_AWESOMEAPI_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";

/// AwesomeAPI last USD-BRL quote (bid side).
#[derive(Clone)]
pub struct AwesomeApiAdapter {
    http_client: Arc<dyn HttpClient>,
    url: String,
    timeout: Duration,
}

impl AwesomeApiAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            url: String::from(DEFAULT_AWESOMEAPI_URL),
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

    async fn fetch_rate(&self) -> Result<FxRate, SourceError> {
        let request = HttpRequest::get(&self.url).with_timeout(self.timeout);
        let response = self.http_client.execute(request).await?;
        let wire: AwesomeApiResponse = decode_json(ProviderId::Awesomeapi, &response)?;

        let bid = wire
            .usd_brl
            .map(|quote| quote.bid)
            .ok_or_else(|| SourceError::invalid_response("awesomeapi payload has no USDBRL quote"))?;
        let usd_brl = parse_decimal("USDBRL.bid", &bid)?;
        if usd_brl <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveValue { field: "USDBRL.bid" }.into());
        }
        Ok(FxRate::new(usd_brl))
    }
}

impl QuoteProvider<FxRate> for AwesomeApiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Awesomeapi
    }

    fn fetch<'a>(&'a self) -> ProviderFuture<'a, FxRate> {
        Box::pin(self.fetch_rate())
    }
}

#[derive(Debug, Deserialize)]
struct AwesomeApiResponse {
    #[serde(rename = "USDBRL", default)]
    usd_brl: Option<AwesomeApiQuote>,
}

#[derive(Debug, Deserialize)]
struct AwesomeApiQuote {
    bid: String,
}
