//! Withdraw request engine (LUD-03).
//!
//! The offer advertises how much the balance can pay out. Executing a
//! withdrawal decodes the wallet's invoice, adds a fee reserve and debits the
//! backend, which pays the invoice.

use lnaddr_proto::WithdrawRequestResponse;
use rand::RngExt;
use rand::rng;
use tracing::info;

use crate::amount::{MilliSats, Sats, msat_to_sats_ceil, sats_to_msat};
use crate::config::LnurlConfig;
use crate::funding::{FundingError, FundingSource, Owner, WithdrawalReceipt};

/// Satoshis added on top of the invoice amount to cover routing fees.
pub const DEFAULT_FEE_RESERVE_SATS: Sats = 100;

/// Description used when an offer carries none.
pub const DEFAULT_WITHDRAW_DESCRIPTION: &str = "Initiating withdrawal";

/// Fresh random 32-byte `k1`, hex encoded.
#[must_use]
pub fn generate_k1() -> String {
    let k1: [u8; 32] = rng().random();
    hex::encode(k1)
}

/// Satoshis to debit for an invoice of `amount_msat` plus `fee_sats`.
///
/// `None` on overflow.
#[must_use]
pub const fn withdrawal_amount_sats(amount_msat: MilliSats, fee_sats: Sats) -> Option<Sats> {
    msat_to_sats_ceil(amount_msat).checked_add(fee_sats)
}

/// Builds withdraw offers and executes withdrawals.
#[derive(Clone, Copy)]
pub struct WithdrawRequestEngine<'a> {
    config: &'a LnurlConfig,
    funding: &'a dyn FundingSource,
}

impl std::fmt::Debug for WithdrawRequestEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WithdrawRequestEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> WithdrawRequestEngine<'a> {
    /// Creates an engine over `config` and `funding`.
    #[must_use]
    pub const fn new(config: &'a LnurlConfig, funding: &'a dyn FundingSource) -> Self {
        Self { config, funding }
    }

    /// Callback URL for withdrawals by `username`.
    #[must_use]
    pub fn callback_url(&self, username: &str) -> String {
        format!("{}/lnurlw/{username}/callback", self.config.base_url())
    }

    /// LUD-03 withdraw offer.
    ///
    /// `maxWithdrawable` is the current balance and `minWithdrawable` is
    /// zero. A fresh `k1` is generated on every call.
    ///
    /// # Errors
    ///
    /// Returns [`FundingError`] if the balance could not be read.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(
            name = "lnurl.withdraw.offer",
            skip_all,
            err,
            fields(username = %username)
        )
    )]
    pub async fn build_withdraw_offer(
        &self,
        description: &str,
        callback_override: Option<&str>,
        username: &str,
    ) -> Result<WithdrawRequestResponse, FundingError> {
        let balance_sats = self.funding.account_balance().await?;
        let callback = callback_override.map_or_else(|| self.callback_url(username), str::to_owned);
        let description = if description.trim().is_empty() {
            DEFAULT_WITHDRAW_DESCRIPTION
        } else {
            description
        };
        info!(username, balance_sats, "LUD-03 withdrawRequest");

        Ok(WithdrawRequestResponse::new(
            callback,
            generate_k1(),
            description,
            0,
            sats_to_msat(balance_sats),
        ))
    }

    /// Pays `invoice` from the balance of `owner`.
    ///
    /// The debit is the invoice amount, rounded up to whole satoshis, plus
    /// `fee_sats`.
    ///
    /// # Errors
    ///
    /// Returns [`FundingError::MalformedInvoice`] if the invoice does not
    /// decode or carries no amount, [`FundingError::InvalidAmount`] if the
    /// debit overflows, and any backend failure.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(
            name = "lnurl.withdraw.execute",
            skip_all,
            err,
            fields(owner = %owner.id)
        )
    )]
    pub async fn initiate_withdrawal(
        &self,
        owner: &Owner,
        invoice: &str,
        fee_sats: Sats,
    ) -> Result<WithdrawalReceipt, FundingError> {
        let details = self.funding.decode_invoice(invoice).await?;
        let amount_msat = details.amount_msat.ok_or_else(|| {
            FundingError::MalformedInvoice("invoice does not specify an amount".into())
        })?;
        let amount_sats = withdrawal_amount_sats(amount_msat, fee_sats)
            .ok_or(FundingError::InvalidAmount(msat_to_sats_ceil(amount_msat)))?;
        info!(
            owner = %owner.id,
            amount_msat,
            fee_sats,
            amount_sats,
            "LUD-03 withdrawal"
        );
        self.funding.withdraw_funds(owner, amount_sats, invoice).await
    }
}
