use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_TICKER_LEN: usize = 10;

/// Normalized asset ticker (`PETR4`, `HGLG11`, `BTC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(pub(crate) String);

impl Ticker {
    /// Parse and normalize a ticker to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(ValidationError::TickerTooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !first.is_ascii_alphabetic() {
                return Err(ValidationError::TickerInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() {
                return Err(ValidationError::TickerInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Ticker {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

/// Parse a comma separated ticker list, skipping blanks.
pub fn parse_ticker_list(raw: &str) -> Result<Vec<Ticker>, ValidationError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Ticker::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_ticker() {
        let parsed = Ticker::parse(" petr4 ").expect("ticker should parse");
        assert_eq!(parsed.as_str(), "PETR4");
    }

    #[test]
    fn rejects_invalid_start() {
        let err = Ticker::parse("4PETR").expect_err("must fail");
        assert!(matches!(err, ValidationError::TickerInvalidStart { .. }));
    }

    #[test]
    fn rejects_punctuation() {
        let err = Ticker::parse("PETR-4").expect_err("must fail");
        assert!(matches!(err, ValidationError::TickerInvalidChar { ch: '-', index: 4 }));
    }

    #[test]
    fn parses_comma_separated_list() {
        let tickers = parse_ticker_list("BOVA11, SMAL11,,IVVB11").expect("list should parse");
        let names = tickers.iter().map(Ticker::as_str).collect::<Vec<_>>();
        assert_eq!(names, vec!["BOVA11", "SMAL11", "IVVB11"]);
    }
}
