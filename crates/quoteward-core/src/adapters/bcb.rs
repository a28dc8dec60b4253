use std::sync::{Arc, Mutex};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest};
use crate::provider::{decode_json, ProviderFuture, QuoteProvider, SourceError};
use crate::{parse_decimal, IndexRates, ProviderId, YieldIndex};

/// `{code}` is replaced by the SGS series number.
pub const DEFAULT_BCB_URL: &str =
    "https://api.bcb.gov.br/dados/serie/bcdata.sgs.{code}/dados/ultimos/1?formato=json";

const SERIES: [(YieldIndex, &str); 3] = [
    (YieldIndex::Cdi, "12"),
    (YieldIndex::Selic, "11"),
    (YieldIndex::Ipca, "433"),
];

/// Central bank SGS time series (last observation of CDI, SELIC and IPCA).
///
/// Series are fetched independently. A series that fails keeps the last value
/// it had in a successful fetch, or its fallback rate when it never answered.
/// The fetch only fails when every series failed. Clones share that memory.
#[derive(Clone)]
pub struct BcbAdapter {
    http_client: Arc<dyn HttpClient>,
    url_template: String,
    timeout: Duration,
    known: Arc<Mutex<IndexRates>>,
}

impl BcbAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            url_template: String::from(DEFAULT_BCB_URL),
            timeout: Duration::from_secs(15),
            known: Arc::new(Mutex::new(IndexRates::last_resort())),
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

    async fn fetch_series(&self, code: &str) -> Result<Decimal, SourceError> {
        let url = self.url_template.replace("{code}", code);
        let request = HttpRequest::get(url).with_timeout(self.timeout);
        let response = self.http_client.execute(request).await?;
        let wire: Vec<SgsObservation> = decode_json(ProviderId::Bcb, &response)?;

        let latest = wire
            .last()
            .ok_or_else(|| SourceError::invalid_response(format!("bcb series {code} is empty")))?;
        Ok(parse_decimal("valor", &latest.valor)?)
    }

    async fn fetch_rates(&self) -> Result<IndexRates, SourceError> {
        let mut answered = Vec::with_capacity(SERIES.len());
        let mut last_error = None;

        for (index, code) in SERIES {
            match self.fetch_series(code).await {
                Ok(value) => answered.push((index, value)),
                Err(error) => {
                    tracing::warn!(series = code, ?index, %error, "bcb series failed, keeping previous rate");
                    last_error = Some(error);
                }
            }
        }

        if answered.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| SourceError::invalid_response("bcb returned no series")));
        }

        let mut known = self.known.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for (index, value) in answered {
            match index {
                YieldIndex::Cdi => known.cdi = value,
                YieldIndex::Selic => known.selic = value,
                YieldIndex::Ipca => known.ipca = value,
                YieldIndex::Pre => {}
            }
        }
        Ok(*known)
    }
}

impl QuoteProvider<IndexRates> for BcbAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Bcb
    }

    fn fetch<'a>(&'a self) -> ProviderFuture<'a, IndexRates> {
        Box::pin(self.fetch_rates())
    }
}

#[derive(Debug, Deserialize)]
struct SgsObservation {
    valor: String,
}
