//! Error types for the HTTP integrations.

use lnaddr::proto::ProtocolError;
use lnaddr::{FundingError, LnurlError};
use reqwest::StatusCode;

/// Errors that can occur while talking to a remote service.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },

    /// The response body is not the expected JSON.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The remote LNURL reply is malformed or an error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A Lightning address or LNURL could not be interpreted.
    #[error(transparent)]
    Lnurl(#[from] LnurlError),
}

impl From<HttpError> for FundingError {
    fn from(value: HttpError) -> Self {
        Self::BackendUnavailable(value.to_string())
    }
}
