use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical upstream provider identifiers used in logs and read metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Hgbrasil,
    Awesomeapi,
    Coinmarketcap,
    Coingecko,
    Bcb,
    Brapi,
}

impl ProviderId {
    pub const ALL: [Self; 6] = [
        Self::Hgbrasil,
        Self::Awesomeapi,
        Self::Coinmarketcap,
        Self::Coingecko,
        Self::Bcb,
        Self::Brapi,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hgbrasil => "hgbrasil",
            Self::Awesomeapi => "awesomeapi",
            Self::Coinmarketcap => "coinmarketcap",
            Self::Coingecko => "coingecko",
            Self::Bcb => "bcb",
            Self::Brapi => "brapi",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market a caller can read the latest quote set for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Fx,
    Crypto,
    Indices,
    Stocks,
    Reits,
    Etfs,
}

impl Market {
    pub const ALL: [Self; 6] = [
        Self::Fx,
        Self::Crypto,
        Self::Indices,
        Self::Stocks,
        Self::Reits,
        Self::Etfs,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fx => "fx",
            Self::Crypto => "crypto",
            Self::Indices => "indices",
            Self::Stocks => "stocks",
            Self::Reits => "reits",
            Self::Etfs => "etfs",
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fx" | "cambio" => Ok(Self::Fx),
            "crypto" => Ok(Self::Crypto),
            "indices" => Ok(Self::Indices),
            "stocks" => Ok(Self::Stocks),
            "reits" | "fiis" => Ok(Self::Reits),
            "etfs" => Ok(Self::Etfs),
            other => Err(ValidationError::InvalidMarket {
                value: other.to_owned(),
            }),
        }
    }
}
