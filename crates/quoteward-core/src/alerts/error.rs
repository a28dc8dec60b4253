use std::time::Duration;

use thiserror::Error;

use super::AlertId;

/// Failure of an [`AlertRepository`](super::AlertRepository) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("alert storage unavailable: {0}")]
    Unavailable(String),
    #[error("alert {0} not found")]
    NotFound(AlertId),
}

/// Failure to hand a notification to the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification to '{address}' failed: {message}")]
pub struct NotifyError {
    pub address: String,
    pub message: String,
}

/// Alert operations surfaced to callers.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("you already have {max} active alerts; wait for one to fire before creating another")]
    QuotaExceeded { max: usize },
    #[error("an alert was created recently; try again in {} minute(s)", .retry_after.as_secs().div_ceil(60).max(1))]
    Throttled { retry_after: Duration },
    #[error("no quote available for '{ticker}'")]
    UnknownTicker { ticker: String },
    #[error("invalid alert: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

impl AlertError {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => "alert.quota_exceeded",
            Self::Throttled { .. } => "alert.throttled",
            Self::UnknownTicker { .. } => "alert.unknown_ticker",
            Self::InvalidInput(_) => "alert.invalid_input",
            Self::Storage(_) => "alert.storage",
        }
    }
}
