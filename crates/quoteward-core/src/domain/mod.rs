//! # Domain Models
//!
//! Canonical quote types shared by providers, orchestrators and the alert engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FxRate`] | USD/BRL exchange rate |
//! | [`CoinQuote`] | Crypto asset priced in USD and BRL |
//! | [`EquityQuote`] | Stock, real-estate fund or ETF priced in BRL |
//! | [`IndexRates`] | CDI, SELIC and IPCA reference rates |
//! | [`DualQuote`] | Any asset priced in both currencies |
//! | [`Ticker`] | Validated asset ticker |
//! | [`UtcDateTime`] | UTC wall-clock timestamp |
//!
//! Prices are `rust_decimal::Decimal`; provider floats are converted once at
//! the adapter boundary through [`decimal_from_f64`].

mod quotes;
mod ticker;
mod timestamp;

pub use quotes::{
    decimal_from_f64, parse_decimal, round_money, CoinQuote, Currency, DualQuote, EquityQuote,
    FxRate, IndexRates, YieldIndex,
};
pub use ticker::{parse_ticker_list, Ticker};
pub use timestamp::UtcDateTime;
