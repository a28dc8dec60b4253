//! Provider contract implemented by every upstream adapter.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;

use crate::http_client::{HttpError, HttpResponse};
use crate::{ProviderId, ValidationError};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidResponse,
    Timeout,
}

/// Structured provider failure, absorbed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    /// Map a non-2xx status of `provider`.
    pub fn from_status(provider: ProviderId, response: &HttpResponse) -> Self {
        match response.status {
            429 => Self::rate_limited(format!("{provider} rate limit exceeded")),
            status if status >= 500 => {
                Self::unavailable(format!("{provider} upstream error (status {status})"))
            }
            status => Self::invalid_response(format!("{provider} rejected request (status {status})")),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
            SourceErrorKind::Timeout => "source.timeout",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

impl From<HttpError> for SourceError {
    fn from(error: HttpError) -> Self {
        if error.timed_out() {
            Self::timeout(error.message().to_owned())
        } else {
            Self::unavailable(error.message().to_owned())
        }
    }
}

impl From<ValidationError> for SourceError {
    fn from(error: ValidationError) -> Self {
        Self::invalid_response(error.to_string())
    }
}

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// One upstream provider able to produce a full payload of type `T`.
pub trait QuoteProvider<T>: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetch and normalize one complete payload.
    fn fetch<'a>(&'a self) -> ProviderFuture<'a, T>;
}

/// Check the status and decode a JSON body into a wire struct.
pub(crate) fn decode_json<W: DeserializeOwned>(
    provider: ProviderId,
    response: &HttpResponse,
) -> Result<W, SourceError> {
    if !response.is_success() {
        return Err(SourceError::from_status(provider, response));
    }
    serde_json::from_str(&response.body).map_err(|e| {
        SourceError::invalid_response(format!("{provider} returned malformed payload: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_error_kinds() {
        let limited = SourceError::from_status(ProviderId::Brapi, &HttpResponse::with_status(429, ""));
        assert_eq!(limited.kind(), SourceErrorKind::RateLimited);
        assert!(limited.retryable());

        let server = SourceError::from_status(ProviderId::Bcb, &HttpResponse::with_status(503, ""));
        assert_eq!(server.kind(), SourceErrorKind::Unavailable);

        let client = SourceError::from_status(ProviderId::Bcb, &HttpResponse::with_status(401, ""));
        assert_eq!(client.code(), "source.invalid_response");
        assert!(!client.retryable());
    }

    #[test]
    fn transport_timeout_becomes_timeout_error() {
        let error = SourceError::from(HttpError::timeout("slow upstream"));
        assert_eq!(error.kind(), SourceErrorKind::Timeout);
        assert_eq!(error.to_string(), "slow upstream (source.timeout)");
    }

    #[test]
    fn malformed_body_is_invalid_response() {
        let error = decode_json::<serde_json::Value>(ProviderId::Hgbrasil, &HttpResponse::ok_json("not json"))
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidResponse);
    }
}
