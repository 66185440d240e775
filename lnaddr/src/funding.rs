//! Funding backend capability.
//!
//! A [`FundingSource`] is the only component that talks to money: it creates
//! invoices, reports the balance, decodes invoices and pays them. The engine
//! treats every call as slow, fallible I/O.
//!
//! Implementations are chosen at construction time and shared for the whole
//! process, typically behind an `Arc`. [`TimeoutFundingSource`] bounds every
//! call so that a hung backend surfaces as
//! [`FundingError::BackendUnavailable`] instead of a stuck request.
//!
//! Dropping a call future drops the in-flight backend request, but a remote
//! backend may still complete the operation on its side.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::amount::{MilliSats, Sats};

/// Default bound applied by [`TimeoutFundingSource`].
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// A receiving identity known to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    /// Backend identifier, usually the address username.
    pub id: String,
}

impl Owner {
    /// Creates an owner handle.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Fields decoded from a BOLT-11 invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDetails {
    /// Requested amount, absent for "any amount" invoices.
    pub amount_msat: Option<MilliSats>,
    /// Hex payment hash.
    pub payment_hash: String,
    /// Direct description, or the hex description hash.
    pub description: Option<String>,
    /// Hex-encoded payee node id.
    pub payee: Option<String>,
    /// Creation time, seconds since the Unix epoch.
    pub timestamp: u64,
    /// Seconds after `timestamp` at which the invoice expires.
    pub expiry_secs: u64,
}

/// Result of paying an invoice out of the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    /// Satoshis debited, fee reserve included.
    pub amount_sats: Sats,
    /// Payment preimage, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preimage: Option<String>,
}

/// Errors reported by a funding backend.
#[derive(Debug, thiserror::Error)]
pub enum FundingError {
    /// The backend could not be reached or answered with a failure.
    #[error("funding backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend refused the amount.
    #[error("invalid amount: {0} sats")]
    InvalidAmount(Sats),

    /// The invoice could not be decoded.
    #[error("malformed invoice: {0}")]
    MalformedInvoice(String),

    /// The owner is not served by this backend.
    #[error("unknown owner: {0}")]
    UnknownOwner(String),
}

/// Payment backend behind a Lightning address.
///
/// All amounts crossing this boundary are whole satoshis.
#[async_trait::async_trait]
pub trait FundingSource: Send + Sync {
    /// Looks up a receiving identity. Has no side effects.
    async fn get_owner(&self, identifier: &str) -> Result<Option<Owner>, FundingError>;

    /// Creates an invoice for `amount_sats` payable to `owner`.
    ///
    /// An empty string means the backend produced no invoice.
    async fn deposit_funds(&self, owner: &Owner, amount_sats: Sats) -> Result<String, FundingError>;

    /// Debits `amount_sats` and pays `invoice`.
    ///
    /// An amount above the spendable balance is [`FundingError::InvalidAmount`]
    /// and nothing is paid.
    async fn withdraw_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
        invoice: &str,
    ) -> Result<WithdrawalReceipt, FundingError>;

    /// Decodes a BOLT-11 invoice.
    async fn decode_invoice(&self, invoice: &str) -> Result<InvoiceDetails, FundingError>;

    /// Current spendable balance.
    async fn account_balance(&self) -> Result<Sats, FundingError>;
}

#[async_trait::async_trait]
impl<T: FundingSource + ?Sized> FundingSource for Arc<T> {
    async fn get_owner(&self, identifier: &str) -> Result<Option<Owner>, FundingError> {
        (**self).get_owner(identifier).await
    }

    async fn deposit_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
    ) -> Result<String, FundingError> {
        (**self).deposit_funds(owner, amount_sats).await
    }

    async fn withdraw_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
        invoice: &str,
    ) -> Result<WithdrawalReceipt, FundingError> {
        (**self).withdraw_funds(owner, amount_sats, invoice).await
    }

    async fn decode_invoice(&self, invoice: &str) -> Result<InvoiceDetails, FundingError> {
        (**self).decode_invoice(invoice).await
    }

    async fn account_balance(&self) -> Result<Sats, FundingError> {
        (**self).account_balance().await
    }
}

/// Wraps a [`FundingSource`] and bounds every call with a timeout.
#[derive(Debug, Clone)]
pub struct TimeoutFundingSource<F> {
    inner: F,
    timeout: Duration,
}

impl<F> TimeoutFundingSource<F> {
    /// Wraps `inner` with the given per-call timeout.
    pub const fn new(inner: F, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Wraps `inner` with [`DEFAULT_BACKEND_TIMEOUT`].
    pub const fn with_default_timeout(inner: F) -> Self {
        Self::new(inner, DEFAULT_BACKEND_TIMEOUT)
    }

    /// Returns the wrapped source.
    pub const fn inner(&self) -> &F {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, FundingError>> + Send,
    ) -> Result<T, FundingError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout = ?self.timeout,
                    "Funding backend call timed out"
                );
                Err(FundingError::BackendUnavailable(format!(
                    "{operation} timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

#[async_trait::async_trait]
impl<F: FundingSource> FundingSource for TimeoutFundingSource<F> {
    async fn get_owner(&self, identifier: &str) -> Result<Option<Owner>, FundingError> {
        self.bounded("get_owner", self.inner.get_owner(identifier))
            .await
    }

    async fn deposit_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
    ) -> Result<String, FundingError> {
        self.bounded("deposit_funds", self.inner.deposit_funds(owner, amount_sats))
            .await
    }

    async fn withdraw_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
        invoice: &str,
    ) -> Result<WithdrawalReceipt, FundingError> {
        self.bounded(
            "withdraw_funds",
            self.inner.withdraw_funds(owner, amount_sats, invoice),
        )
        .await
    }

    async fn decode_invoice(&self, invoice: &str) -> Result<InvoiceDetails, FundingError> {
        self.bounded("decode_invoice", self.inner.decode_invoice(invoice))
            .await
    }

    async fn account_balance(&self) -> Result<Sats, FundingError> {
        self.bounded("account_balance", self.inner.account_balance())
            .await
    }
}
