//! Protocol facade.
//!
//! [`LnurlHandler`] is the stable entry point used by transports. It owns the
//! configuration and a shared funding source, holds no per-request state, and
//! can be shared across concurrent requests behind an `Arc`. Every request
//! builds its own [`RequestContext`].

use std::sync::Arc;

use lnaddr_proto::{MESSAGE_TAG, PayActionResponse, PayRequestResponse, WithdrawRequestResponse};
use url::form_urlencoded;

use crate::address::{AddressResolver, BoundAddress, LightningAddress};
use crate::amount::{MilliSats, Sats};
use crate::config::LnurlConfig;
use crate::error::LnurlError;
use crate::funding::{FundingError, FundingSource, Owner, WithdrawalReceipt};
use crate::lnurl;
use crate::metadata::{self, Metadata};
use crate::pay::PayRequestEngine;
use crate::withdraw::{DEFAULT_WITHDRAW_DESCRIPTION, WithdrawRequestEngine};

/// Per-request resolution of an address.
///
/// Dropped at the end of the request; nothing carries over between calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    username: String,
    bound: Option<BoundAddress>,
    custom_metadata_text: Option<String>,
}

impl RequestContext {
    /// Resolves `identifier` and confirms its username with the backend.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn establish<F>(
        config: &LnurlConfig,
        funding: &F,
        identifier: &str,
    ) -> Result<Self, FundingError>
    where
        F: FundingSource + ?Sized,
    {
        let resolver = AddressResolver::new(config.domain());
        let username = resolver.resolve(identifier);
        let bound = resolver.bind(funding, &username).await?;
        Ok(Self {
            username,
            bound,
            custom_metadata_text: None,
        })
    }

    /// Overrides the `text/plain` metadata. Blank text is ignored.
    #[must_use]
    pub fn with_metadata_text(mut self, text: Option<&str>) -> Self {
        self.custom_metadata_text = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
        self
    }

    /// Username extracted from the identifier.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Resolved owner and address, if the user is known.
    #[must_use]
    pub const fn bound(&self) -> Option<&BoundAddress> {
        self.bound.as_ref()
    }

    /// Canonical address, if the user is known.
    #[must_use]
    pub fn resolved_address(&self) -> Option<&LightningAddress> {
        self.bound.as_ref().map(|b| &b.address)
    }

    /// Backend owner, if the user is known.
    #[must_use]
    pub fn owner(&self) -> Option<&Owner> {
        self.bound.as_ref().map(|b| &b.owner)
    }

    /// Custom description, or the default one for the username.
    #[must_use]
    pub fn metadata_text(&self) -> String {
        self.custom_metadata_text
            .clone()
            .unwrap_or_else(|| metadata::default_description(&self.username))
    }

    /// Metadata for the resolved address.
    #[must_use]
    pub fn metadata(&self) -> Option<Metadata> {
        self.resolved_address()
            .map(|address| Metadata::new(self.metadata_text(), address))
    }
}

/// Success message of the facade's pay callback.
#[must_use]
pub fn payment_message(username: &str) -> String {
    format!("Payment to ln address for {username}")
}

/// Stateless LNURL facade over a funding source.
#[derive(Clone)]
pub struct LnurlHandler {
    config: LnurlConfig,
    funding: Arc<dyn FundingSource>,
}

impl std::fmt::Debug for LnurlHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LnurlHandler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LnurlHandler {
    /// Creates a facade for `config` backed by `funding`.
    #[must_use]
    pub fn new(config: LnurlConfig, funding: Arc<dyn FundingSource>) -> Self {
        Self { config, funding }
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &LnurlConfig {
        &self.config
    }

    /// The shared funding source.
    #[must_use]
    pub fn funding(&self) -> &dyn FundingSource {
        self.funding.as_ref()
    }

    /// Pay request engine over this facade's state.
    #[must_use]
    pub fn pay_engine(&self) -> PayRequestEngine<'_> {
        PayRequestEngine::new(&self.config, self.funding.as_ref())
    }

    /// Withdraw request engine over this facade's state.
    #[must_use]
    pub fn withdraw_engine(&self) -> WithdrawRequestEngine<'_> {
        WithdrawRequestEngine::new(&self.config, self.funding.as_ref())
    }

    /// Resolves `identifier` to a known user.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn get_user(&self, identifier: &str) -> Result<Option<BoundAddress>, FundingError> {
        let context =
            RequestContext::establish(&self.config, self.funding.as_ref(), identifier).await?;
        Ok(context.bound)
    }

    /// LUD-16 discovery response.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn get_ln_details(
        &self,
        identifier: &str,
        min_sats: Option<Sats>,
        description: Option<&str>,
    ) -> Result<Option<PayRequestResponse>, FundingError> {
        self.pay_engine()
            .build_discovery_response(identifier, min_sats, description)
            .await
    }

    /// LUD-06 callback response with a `message` success action.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn generate_invoice(
        &self,
        identifier: &str,
        amount_msat: MilliSats,
    ) -> Result<Option<PayActionResponse>, FundingError> {
        self.pay_engine()
            .build_callback_response(identifier, amount_msat, MESSAGE_TAG, &payment_message)
            .await
    }

    /// Plain pay link for `username`, with optional query parameters.
    #[must_use]
    pub fn pay_link(
        &self,
        username: &str,
        amount_sats: Option<Sats>,
        description: Option<&str>,
    ) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(amount) = amount_sats {
            query.append_pair("amount", &amount.to_string());
        }
        if let Some(description) = description {
            query.append_pair("description", description);
        }
        let query = query.finish();
        let link = format!("{}/lnurlp/{username}", self.config.base_url());
        if query.is_empty() {
            link
        } else {
            format!("{link}?{query}")
        }
    }

    /// Bech32 LNURL of [`LnurlHandler::pay_link`].
    ///
    /// # Errors
    ///
    /// Returns [`LnurlError::Encoding`] if the link cannot be encoded.
    pub fn encoded_pay_link(
        &self,
        username: &str,
        amount_sats: Option<Sats>,
        description: Option<&str>,
    ) -> Result<String, LnurlError> {
        lnurl::encode(&self.pay_link(username, amount_sats, description))
    }

    /// LUD-03 withdraw offer for a known user.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn withdraw_offer(
        &self,
        identifier: &str,
        description: Option<&str>,
    ) -> Result<Option<WithdrawRequestResponse>, FundingError> {
        let Some(bound) = self.get_user(identifier).await? else {
            tracing::warn!(identifier, "LUD-03 withdrawRequest for unknown user");
            return Ok(None);
        };
        let offer = self
            .withdraw_engine()
            .build_withdraw_offer(
                description.unwrap_or(DEFAULT_WITHDRAW_DESCRIPTION),
                None,
                bound.address.username(),
            )
            .await?;
        Ok(Some(offer))
    }

    /// Pays `invoice` from the balance of a known user.
    ///
    /// # Errors
    ///
    /// Propagates backend and invoice failures.
    pub async fn initiate_withdrawal(
        &self,
        identifier: &str,
        invoice: &str,
        fee_sats: Sats,
    ) -> Result<Option<WithdrawalReceipt>, FundingError> {
        let Some(bound) = self.get_user(identifier).await? else {
            tracing::warn!(identifier, "LUD-03 withdrawal for unknown user");
            return Ok(None);
        };
        let receipt = self
            .withdraw_engine()
            .initiate_withdrawal(&bound.owner, invoice, fee_sats)
            .await?;
        Ok(Some(receipt))
    }
}
