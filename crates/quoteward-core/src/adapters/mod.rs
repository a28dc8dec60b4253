//! Upstream provider adapters.
//!
//! | Adapter | Market | Payload |
//! |---------|--------|---------|
//! | [`HgBrasilAdapter`] | FX primary | [`FxRate`] |
//! | [`AwesomeApiAdapter`] | FX secondary | [`FxRate`] |
//! | [`CoinMarketCapAdapter`] | Crypto primary | `Vec<CoinQuote>` |
//! | [`CoinGeckoAdapter`] | Crypto secondary | `Vec<CoinQuote>` |
//! | [`BcbAdapter`] | Fixed income | [`IndexRates`] |
//! | [`BrapiAdapter`] | Stocks, REITs, ETFs | `Vec<EquityQuote>` |
//!
//! Each adapter decodes its provider's JSON into private wire structs and
//! normalizes them in one function.
//!
//! [`CoinQuote`]: crate::CoinQuote
//! [`EquityQuote`]: crate::EquityQuote
//! [`IndexRates`]: crate::IndexRates

mod awesomeapi;
mod bcb;
mod brapi;
mod coingecko;
mod coinmarketcap;
mod hgbrasil;

use std::future::Future;
use std::pin::Pin;

pub use awesomeapi::{AwesomeApiAdapter, DEFAULT_AWESOMEAPI_URL};
pub use bcb::{BcbAdapter, DEFAULT_BCB_URL};
pub use brapi::{BrapiAdapter, DEFAULT_BRAPI_URL, ETF_TICKERS, REIT_TICKERS, STOCK_TICKERS};
pub use coingecko::{CoinGeckoAdapter, DEFAULT_COINGECKO_URL};
pub use coinmarketcap::{CoinMarketCapAdapter, DEFAULT_COINMARKETCAP_URL, TOP_CRYPTO_SYMBOLS};
pub use hgbrasil::{HgBrasilAdapter, DEFAULT_HGBRASIL_URL};

use crate::orchestrator::SourceOrchestrator;
use crate::FxRate;

/// Source of the USD/BRL rate crypto adapters convert with.
pub trait UsdBrlRate: Send + Sync {
    fn usd_brl<'a>(&'a self) -> Pin<Box<dyn Future<Output = FxRate> + Send + 'a>>;
}

/// The FX orchestrator's public read; never fails.
impl UsdBrlRate for SourceOrchestrator<FxRate> {
    fn usd_brl<'a>(&'a self) -> Pin<Box<dyn Future<Output = FxRate> + Send + 'a>> {
        Box::pin(async move { self.latest().await.data })
    }
}

/// Constant rate, for offline tooling and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedUsdBrl(pub FxRate);

impl UsdBrlRate for FixedUsdBrl {
    fn usd_brl<'a>(&'a self) -> Pin<Box<dyn Future<Output = FxRate> + Send + 'a>> {
        let rate = self.0;
        Box::pin(async move { rate })
    }
}
