//! Error types for the HTTP endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lnaddr::proto::StatusResponse;
use lnaddr::{FundingError, LnurlError};

/// Reason sent to wallets when the funding backend is down.
pub const BACKEND_UNAVAILABLE_REASON: &str =
    "service temporarily unavailable. please try again later";

/// Errors returned by the endpoints.
///
/// Wallets only ever see a generic reason; details go to the logs.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The request was declined (unknown user, bad parameters, amount out of
    /// bounds, missing invoice).
    #[error("request rejected")]
    Rejected,

    /// The request lacks the credential required for this endpoint.
    #[error("unauthorized")]
    Unauthorized,

    /// The funding backend failed.
    #[error(transparent)]
    Funding(#[from] FundingError),

    /// The engine failed outside the backend.
    #[error(transparent)]
    Lnurl(#[from] LnurlError),
}

impl ServerError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Funding(FundingError::BackendUnavailable(_))
            | Self::Lnurl(LnurlError::Funding(FundingError::BackendUnavailable(_))) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Lnurl(LnurlError::InvalidConfig(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected | Self::Funding(_) | Self::Lnurl(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_client_error() {
            tracing::debug!(error = %self, "Request rejected");
            StatusResponse::rejected()
        } else {
            tracing::error!(error = %self, "Request failed");
            StatusResponse::error(BACKEND_UNAVAILABLE_REASON)
        };
        (status, axum::Json(body)).into_response()
    }
}
