use thiserror::Error;

/// Validation and contract errors exposed by `quoteward-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,
    #[error("ticker length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker must start with an ASCII letter: '{ch}'")]
    TickerInvalidStart { ch: char },
    #[error("ticker contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },

    #[error("invalid market '{value}', expected one of fx, crypto, indices, stocks, reits, etfs")]
    InvalidMarket { value: String },
    #[error("invalid currency '{value}', expected BRL or USD")]
    InvalidCurrency { value: String },
    #[error("invalid index '{value}', expected one of CDI, SELIC, IPCA, PRE")]
    InvalidIndex { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("field '{field}' must be a finite decimal number: '{value}'")]
    InvalidDecimal { field: &'static str, value: String },
    #[error("field '{field}' must be positive")]
    NonPositiveValue { field: &'static str },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
