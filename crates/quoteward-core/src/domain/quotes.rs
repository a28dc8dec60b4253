use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{Ticker, ValidationError};

/// Currencies a quote or alert can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Brl,
    Usd,
}

impl Currency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brl => "BRL",
            Self::Usd => "USD",
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Brl => "R$",
            Self::Usd => "US$",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BRL" => Ok(Self::Brl),
            "USD" => Ok(Self::Usd),
            other => Err(ValidationError::InvalidCurrency {
                value: other.to_owned(),
            }),
        }
    }
}

/// USD/BRL exchange rate (price of one dollar in reais).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRate {
    pub usd_brl: Decimal,
}

impl FxRate {
    pub const fn new(usd_brl: Decimal) -> Self {
        Self { usd_brl }
    }

    /// Used when no provider answered and nothing was ever cached.
    pub fn last_resort() -> Self {
        Self::new(Decimal::new(550, 2))
    }
}

/// One crypto asset priced in both currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinQuote {
    pub symbol: Ticker,
    pub name: String,
    pub price_usd: Decimal,
    pub price_brl: Decimal,
}

impl CoinQuote {
    pub fn priced(symbol: Ticker, name: impl Into<String>, price_usd: Decimal, rate: FxRate) -> Self {
        Self {
            symbol,
            name: name.into(),
            price_usd,
            price_brl: price_usd * rate.usd_brl,
        }
    }

    pub fn last_resort() -> Vec<Self> {
        vec![Self::priced(
            Ticker(String::from("BTC")),
            "Bitcoin",
            Decimal::new(98_000, 0),
            FxRate::new(Decimal::new(6, 0)),
        )]
    }
}

/// Listed stock, real-estate fund or ETF quoted in BRL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityQuote {
    pub ticker: Ticker,
    pub name: Option<String>,
    pub price_brl: Decimal,
    pub change_percent: Option<Decimal>,
    pub logo_url: Option<String>,
}

/// Reference rates published by the central bank, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRates {
    /// Daily DI rate.
    pub cdi: Decimal,
    /// Daily SELIC rate.
    pub selic: Decimal,
    /// Monthly IPCA inflation.
    pub ipca: Decimal,
}

/// Benchmark a fixed-income position is indexed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum YieldIndex {
    Cdi,
    Selic,
    Ipca,
    /// Pre-fixed annual rate.
    Pre,
}

impl FromStr for YieldIndex {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "" | "CDI" => Ok(Self::Cdi),
            "SELIC" => Ok(Self::Selic),
            "IPCA" => Ok(Self::Ipca),
            "PRE" => Ok(Self::Pre),
            other => Err(ValidationError::InvalidIndex {
                value: other.to_owned(),
            }),
        }
    }
}

const BUSINESS_DAYS_PER_YEAR: i64 = 252;
const BUSINESS_DAYS_PER_MONTH: i64 = 22;

impl IndexRates {
    pub fn fallback_for(index: YieldIndex) -> Decimal {
        match index {
            YieldIndex::Cdi | YieldIndex::Selic => Decimal::new(45, 3),
            YieldIndex::Ipca => Decimal::new(40, 2),
            YieldIndex::Pre => Decimal::ZERO,
        }
    }

    pub fn last_resort() -> Self {
        Self {
            cdi: Self::fallback_for(YieldIndex::Cdi),
            selic: Self::fallback_for(YieldIndex::Selic),
            ipca: Self::fallback_for(YieldIndex::Ipca),
        }
    }

    pub fn rate(&self, index: YieldIndex) -> Option<Decimal> {
        match index {
            YieldIndex::Cdi => Some(self.cdi),
            YieldIndex::Selic => Some(self.selic),
            YieldIndex::Ipca => Some(self.ipca),
            YieldIndex::Pre => None,
        }
    }

    /// Amount `balance` earns in one business day.
    ///
    /// `percent` is the contracted share of the index (110 means 110% of CDI) or,
    /// for [`YieldIndex::Pre`], the annual pre-fixed rate. IPCA is published
    /// monthly and is spread over 22 business days.
    pub fn daily_yield(&self, balance: Decimal, percent: Decimal, index: YieldIndex) -> Decimal {
        let hundred = Decimal::ONE_HUNDRED;

        let earned = match index {
            YieldIndex::Pre => {
                balance * percent / Decimal::from(BUSINESS_DAYS_PER_YEAR) / hundred
            }
            YieldIndex::Ipca => {
                let daily = self.ipca / Decimal::from(BUSINESS_DAYS_PER_MONTH) / hundred;
                balance * daily * (percent / hundred)
            }
            YieldIndex::Cdi | YieldIndex::Selic => {
                let rate = self.rate(index).unwrap_or(self.cdi);
                balance * (rate / hundred) * (percent / hundred)
            }
        };

        round_money(earned)
    }
}

/// A price expressed in both reais and dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualQuote {
    pub brl: Decimal,
    pub usd: Decimal,
}

impl DualQuote {
    pub const fn new(brl: Decimal, usd: Decimal) -> Self {
        Self { brl, usd }
    }

    /// Derive the dollar leg from a BRL price; `None` when the rate is zero.
    pub fn from_brl(brl: Decimal, rate: FxRate) -> Option<Self> {
        let usd = brl.checked_div(rate.usd_brl)?;
        Some(Self::new(brl, round_money(usd)))
    }

    pub const fn price_in(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Brl => self.brl,
            Currency::Usd => self.usd,
        }
    }
}

/// Round to cents, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a JSON float into a decimal through its shortest textual form.
pub fn decimal_from_f64(field: &'static str, value: f64) -> Result<Decimal, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidDecimal {
            field,
            value: value.to_string(),
        });
    }
    parse_decimal(field, &value.to_string())
}

/// Parse a decimal accepting either `.` or `,` as separator.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, ValidationError> {
    let normalized = raw.trim().replace(',', ".");
    Decimal::from_str(&normalized).map_err(|_| ValidationError::InvalidDecimal {
        field,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rates() -> IndexRates {
        IndexRates {
            cdi: dec!(0.0501),
            selic: dec!(0.0502),
            ipca: dec!(0.44),
        }
    }

    #[test]
    fn daily_yield_for_cdi_uses_contracted_percent() {
        let earned = rates().daily_yield(dec!(10000), dec!(110), YieldIndex::Cdi);
        assert_eq!(earned, dec!(5.51));
    }

    #[test]
    fn daily_yield_for_pre_spreads_annual_rate_over_business_days() {
        let earned = rates().daily_yield(dec!(10000), dec!(12), YieldIndex::Pre);
        assert_eq!(earned, dec!(4.76));
    }

    #[test]
    fn daily_yield_for_ipca_spreads_monthly_rate() {
        let earned = rates().daily_yield(dec!(10000), dec!(100), YieldIndex::Ipca);
        assert_eq!(earned, dec!(2.00));
    }

    #[test]
    fn blank_index_defaults_to_cdi() {
        assert_eq!("".parse::<YieldIndex>().expect("blank is CDI"), YieldIndex::Cdi);
        assert!("LIBOR".parse::<YieldIndex>().is_err());
    }

    #[test]
    fn dual_quote_converts_brl_to_usd_in_cents() {
        let quote = DualQuote::from_brl(dec!(40.50), FxRate::new(dec!(5.40))).expect("non-zero rate");
        assert_eq!(quote.usd, dec!(7.50));
        assert_eq!(quote.price_in(Currency::Brl), dec!(40.50));
        assert!(DualQuote::from_brl(dec!(1), FxRate::new(Decimal::ZERO)).is_none());
    }

    #[test]
    fn decimals_from_provider_floats_keep_short_form() {
        assert_eq!(decimal_from_f64("price", 5.42).expect("finite"), dec!(5.42));
        assert_eq!(parse_decimal("valor", "0,045").expect("comma decimal"), dec!(0.045));
        assert!(decimal_from_f64("price", f64::NAN).is_err());
    }

    #[test]
    fn crypto_last_resort_is_priced_in_both_currencies() {
        let coins = CoinQuote::last_resort();
        assert_eq!(coins.len(), 1);
        assert_eq!(coins[0].symbol.as_str(), "BTC");
        assert_eq!(coins[0].price_brl, dec!(588000));
    }
}
