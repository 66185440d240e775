//! Error types for the LNURL engine.
//!
//! Two kinds of failure are kept apart. A [`Rejection`] is an expected
//! protocol outcome (unknown user, amount out of bounds); engines log it and
//! return an absent result. An [`LnurlError`] is everything else, in
//! particular backend outages, and is propagated so that an outage is never
//! reported to a wallet as an unknown user.

use std::fmt;

use crate::funding::FundingError;

/// Expected reasons for declining a request.
///
/// Rejections are logged server-side only; wallets receive a generic reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The address does not resolve to a receiving identity.
    UnknownUser,
    /// The amount is below the configured minimum.
    AmountTooLow,
    /// The amount is above the configured maximum.
    AmountTooHigh,
    /// The backend returned no invoice.
    InvoiceGenerationFailed,
}

impl Rejection {
    /// Stable machine-readable name, used as a log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownUser => "UnknownUser",
            Self::AmountTooLow => "AmountTooLow",
            Self::AmountTooHigh => "AmountTooHigh",
            Self::InvoiceGenerationFailed => "InvoiceGenerationFailed",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the engine and the facade.
#[derive(Debug, thiserror::Error)]
pub enum LnurlError {
    /// The funding backend failed.
    #[error(transparent)]
    Funding(#[from] FundingError),

    /// An identifier is not a `username@domain` pair.
    #[error("invalid lightning address: {0}")]
    InvalidAddress(String),

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Bech32 LNURL encoding or decoding failed.
    #[error("lnurl encoding error: {0}")]
    Encoding(String),

    /// Metadata is not a JSON array of `[mime, value]` pairs.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(#[from] serde_json::Error),
}

/// Internal outcome of an engine step: declined or failed.
#[derive(Debug)]
pub(crate) enum Declined {
    Rejected(Rejection),
    Failed(FundingError),
}

impl From<Rejection> for Declined {
    fn from(value: Rejection) -> Self {
        Self::Rejected(value)
    }
}

impl From<FundingError> for Declined {
    fn from(value: FundingError) -> Self {
        Self::Failed(value)
    }
}

/// Turns a declined step into an absent result, keeping real failures.
pub(crate) fn absent_on_rejection<T>(
    result: Result<T, Declined>,
) -> Result<Option<T>, FundingError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Declined::Rejected(rejection)) => {
            tracing::debug!(rejection = %rejection, "Request declined");
            Ok(None)
        }
        Err(Declined::Failed(err)) => Err(err),
    }
}

impl LnurlError {
    /// Returns `true` if the funding backend could not be reached.
    #[must_use]
    pub const fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::Funding(FundingError::BackendUnavailable(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_become_absent() {
        for rejection in [
            Rejection::UnknownUser,
            Rejection::AmountTooLow,
            Rejection::AmountTooHigh,
            Rejection::InvoiceGenerationFailed,
        ] {
            let result: Result<u8, Declined> = Err(rejection.into());
            assert!(matches!(absent_on_rejection(result), Ok(None)));
        }
        assert!(matches!(absent_on_rejection(Ok::<_, Declined>(7)), Ok(Some(7))));
    }

    #[test]
    fn test_failures_propagate() {
        let result: Result<u8, Declined> =
            Err(FundingError::BackendUnavailable("timeout".into()).into());
        assert!(matches!(
            absent_on_rejection(result),
            Err(FundingError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_backend_unavailable_is_detected() {
        let outage = LnurlError::from(FundingError::BackendUnavailable("x".into()));
        assert!(outage.is_backend_unavailable());
        assert!(!LnurlError::Encoding("x".into()).is_backend_unavailable());
    }
}
