//! In-memory [`FundingSource`] for tests.

use std::sync::{Mutex, PoisonError};

use crate::amount::{MilliSats, Sats};
use crate::funding::{FundingError, FundingSource, InvoiceDetails, Owner, WithdrawalReceipt};

/// Invoice string returned by [`MockFunding`] unless overridden.
pub const MOCK_INVOICE: &str = "lnbc50n1mockinvoice";

/// Scriptable funding source recording every deposit and withdrawal.
#[derive(Debug)]
pub struct MockFunding {
    owner: String,
    invoice: String,
    balance_sats: Sats,
    decoded_amount_msat: Option<MilliSats>,
    unavailable: bool,
    deposits: Mutex<Vec<(String, Sats)>>,
    withdrawals: Mutex<Vec<(String, Sats, String)>>,
}

impl MockFunding {
    /// Creates a mock serving the single identity `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            invoice: MOCK_INVOICE.to_owned(),
            balance_sats: 0,
            decoded_amount_msat: Some(0),
            unavailable: false,
            deposits: Mutex::new(Vec::new()),
            withdrawals: Mutex::new(Vec::new()),
        }
    }

    /// Sets the invoice returned by `deposit_funds`. Empty means "no invoice".
    #[must_use]
    pub fn with_invoice(mut self, invoice: impl Into<String>) -> Self {
        self.invoice = invoice.into();
        self
    }

    /// Sets the reported balance.
    #[must_use]
    pub const fn with_balance(mut self, balance_sats: Sats) -> Self {
        self.balance_sats = balance_sats;
        self
    }

    /// Sets the amount every decoded invoice reports.
    #[must_use]
    pub const fn with_decoded_amount(mut self, amount_msat: Option<MilliSats>) -> Self {
        self.decoded_amount_msat = amount_msat;
        self
    }

    /// Makes every call fail with [`FundingError::BackendUnavailable`].
    #[must_use]
    pub const fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// `(owner, amount_sats)` of every `deposit_funds` call.
    pub fn deposits(&self) -> Vec<(String, Sats)> {
        self.deposits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(owner, amount_sats, invoice)` of every `withdraw_funds` call.
    pub fn withdrawals(&self) -> Vec<(String, Sats, String)> {
        self.withdrawals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_available(&self) -> Result<(), FundingError> {
        if self.unavailable {
            Err(FundingError::BackendUnavailable("mock backend offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl FundingSource for MockFunding {
    async fn get_owner(&self, identifier: &str) -> Result<Option<Owner>, FundingError> {
        self.check_available()?;
        Ok((identifier == self.owner).then(|| Owner::new(identifier)))
    }

    async fn deposit_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
    ) -> Result<String, FundingError> {
        self.check_available()?;
        self.deposits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((owner.id.clone(), amount_sats));
        Ok(self.invoice.clone())
    }

    async fn withdraw_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
        invoice: &str,
    ) -> Result<WithdrawalReceipt, FundingError> {
        self.check_available()?;
        self.withdrawals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((owner.id.clone(), amount_sats, invoice.to_owned()));
        Ok(WithdrawalReceipt {
            amount_sats,
            preimage: None,
        })
    }

    async fn decode_invoice(&self, invoice: &str) -> Result<InvoiceDetails, FundingError> {
        self.check_available()?;
        if !invoice.starts_with("ln") {
            return Err(FundingError::MalformedInvoice(invoice.to_owned()));
        }
        Ok(InvoiceDetails {
            amount_msat: self.decoded_amount_msat,
            payment_hash: "00".repeat(32),
            description: None,
            payee: None,
            timestamp: 0,
            expiry_secs: 3600,
        })
    }

    async fn account_balance(&self) -> Result<Sats, FundingError> {
        self.check_available()?;
        Ok(self.balance_sats)
    }
}
