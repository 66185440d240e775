//! Pay request engine (LUD-06 and LUD-16).
//!
//! Two steps: the discovery response advertises bounds and metadata for an
//! address; the callback turns a wallet-chosen amount into an invoice.
//! Bounds are enforced in whole satoshis before the backend is called, so no
//! unusable invoice is ever created.

use lnaddr_proto::{PayActionResponse, PayRequestResponse, SuccessAction};
use tracing::{info, warn};

use crate::amount::{MilliSats, Sats, msat_to_sats_ceil, sats_to_msat};
use crate::config::LnurlConfig;
use crate::error::{Declined, Rejection, absent_on_rejection};
use crate::funding::{FundingError, FundingSource};
use crate::handler::RequestContext;
use crate::metadata::Metadata;

/// Formats the success message shown to the payer, given the username.
pub type MessageTemplate = dyn Fn(&str) -> String + Send + Sync;

/// Default success message.
#[must_use]
pub fn thanks_for_zapping(username: &str) -> String {
    format!("Thanks for zapping {username}")
}

/// Builds pay request responses for the configured identity.
#[derive(Clone, Copy)]
pub struct PayRequestEngine<'a> {
    config: &'a LnurlConfig,
    funding: &'a dyn FundingSource,
}

impl std::fmt::Debug for PayRequestEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayRequestEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> PayRequestEngine<'a> {
    /// Creates an engine over `config` and `funding`.
    #[must_use]
    pub const fn new(config: &'a LnurlConfig, funding: &'a dyn FundingSource) -> Self {
        Self { config, funding }
    }

    /// LUD-16 discovery response for `username`.
    ///
    /// A non-zero `min_sats_override` replaces the configured minimum.
    /// `description` replaces the default `text/plain` metadata entry.
    /// Returns `None` for unknown users or an override above the configured
    /// maximum.
    ///
    /// # Errors
    ///
    /// Returns [`FundingError`] if the backend could not confirm the user.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(
            name = "lnurl.pay.discovery",
            skip_all,
            err,
            fields(username = %username)
        )
    )]
    pub async fn build_discovery_response(
        &self,
        username: &str,
        min_sats_override: Option<Sats>,
        description: Option<&str>,
    ) -> Result<Option<PayRequestResponse>, FundingError> {
        absent_on_rejection(self.discovery(username, min_sats_override, description).await)
    }

    async fn discovery(
        &self,
        username: &str,
        min_sats_override: Option<Sats>,
        description: Option<&str>,
    ) -> Result<PayRequestResponse, Declined> {
        let context = RequestContext::establish(self.config, self.funding, username)
            .await?
            .with_metadata_text(description);
        let username = context.username();
        let Some(address) = context.resolved_address() else {
            warn!(username, reason = %Rejection::UnknownUser, "LUD-16 payRequest for unknown user");
            return Err(Rejection::UnknownUser.into());
        };

        let min_sats = min_sats_override
            .filter(|sats| *sats > 0)
            .unwrap_or(self.config.min_sats());
        if min_sats > self.config.max_sats() {
            warn!(
                username,
                min_sats,
                reason = %Rejection::AmountTooHigh,
                "LUD-16 payRequest with minimum above the receivable maximum"
            );
            return Err(Rejection::AmountTooHigh.into());
        }

        let metadata = Metadata::new(context.metadata_text(), address);
        info!(
            username,
            address = %address,
            metadata_hash = %metadata.hash(),
            "LUD-16 payRequest"
        );

        Ok(PayRequestResponse::new(
            format!("{}/lnurlp/{username}/callback", self.config.base_url()),
            sats_to_msat(min_sats),
            sats_to_msat(self.config.max_sats()),
            metadata.serialize(),
        ))
    }

    /// LUD-06 callback response: an invoice for `amount_msat`.
    ///
    /// The amount is rounded up to whole satoshis and checked against the
    /// configured bounds before the backend is asked for an invoice. The
    /// success action carries `tag` and `message(username)`. Returns `None`
    /// for unknown users, out-of-bounds amounts, or an empty invoice.
    ///
    /// # Errors
    ///
    /// Returns [`FundingError`] if the backend failed.
    #[cfg_attr(
        feature = "telemetry",
        tracing::instrument(
            name = "lnurl.pay.callback",
            skip_all,
            err,
            fields(username = %username, amount_msat)
        )
    )]
    pub async fn build_callback_response(
        &self,
        username: &str,
        amount_msat: MilliSats,
        tag: &str,
        message: &MessageTemplate,
    ) -> Result<Option<PayActionResponse>, FundingError> {
        absent_on_rejection(self.callback(username, amount_msat, tag, message).await)
    }

    async fn callback(
        &self,
        username: &str,
        amount_msat: MilliSats,
        tag: &str,
        message: &MessageTemplate,
    ) -> Result<PayActionResponse, Declined> {
        let context = RequestContext::establish(self.config, self.funding, username).await?;
        let username = context.username();
        let Some(owner) = context.owner() else {
            warn!(
                username,
                reason = %Rejection::UnknownUser,
                "LUD-06 payRequestCallback for unknown user"
            );
            return Err(Rejection::UnknownUser.into());
        };

        let amount_sats = msat_to_sats_ceil(amount_msat);
        info!(username, amount_sats, amount_msat, "LUD-06 payRequestCallback");

        if amount_sats < self.config.min_sats() {
            warn!(
                username,
                amount_sats,
                reason = %Rejection::AmountTooLow,
                "LUD-06 payRequestCallback with too-low amount"
            );
            return Err(Rejection::AmountTooLow.into());
        }
        if amount_sats > self.config.max_sats() {
            warn!(
                username,
                amount_sats,
                reason = %Rejection::AmountTooHigh,
                "LUD-06 payRequestCallback with too-high amount"
            );
            return Err(Rejection::AmountTooHigh.into());
        }

        let invoice = self.funding.deposit_funds(owner, amount_sats).await?;
        if invoice.trim().is_empty() {
            warn!(
                username,
                amount_sats,
                reason = %Rejection::InvoiceGenerationFailed,
                "Failed to generate lightning invoice"
            );
            return Err(Rejection::InvoiceGenerationFailed.into());
        }

        Ok(PayActionResponse::new(
            invoice,
            Some(SuccessAction {
                tag: tag.to_owned(),
                message: message(username),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata;
    use crate::testing::{MOCK_INVOICE, MockFunding};

    fn config() -> LnurlConfig {
        LnurlConfig::new("pay.example.com", 1, 2_000_000).unwrap()
    }

    #[tokio::test]
    async fn test_discovery_example() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        let response = engine
            .build_discovery_response("nwc", None, None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.callback, "https://pay.example.com/lnurlp/nwc/callback");
        assert_eq!(response.min_sendable, 1000);
        assert_eq!(response.max_sendable, 2_000_000_000);
        assert_eq!(
            response.metadata,
            r#"[["text/plain", "Zap nwc some sats"], ["text/identifier", "nwc@pay.example.com"]]"#
        );
    }

    #[tokio::test]
    async fn test_discovery_accepts_qualified_identifier() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        let response = engine
            .build_discovery_response("nwc@elsewhere.org", None, Some("Coffee"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(response.callback, "https://pay.example.com/lnurlp/nwc/callback");
        let parsed = metadata::Metadata::parse(&response.metadata).unwrap();
        assert_eq!(parsed.description(), Some("Coffee"));
        assert_eq!(parsed.identifier(), Some("nwc@pay.example.com"));
    }

    #[tokio::test]
    async fn test_discovery_bounds_are_ordered_multiples_of_1000() {
        let config = LnurlConfig::new("d", 10, 500).unwrap();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        for override_sats in [None, Some(0), Some(5), Some(10), Some(250), Some(500)] {
            let response = engine
                .build_discovery_response("nwc", override_sats, None)
                .await
                .unwrap()
                .unwrap();
            assert!(response.min_sendable >= 1000);
            assert!(response.min_sendable <= response.max_sendable);
            assert_eq!(response.min_sendable % 1000, 0);
            assert_eq!(response.max_sendable % 1000, 0);
        }
    }

    #[tokio::test]
    async fn test_discovery_min_override() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        let response = engine
            .build_discovery_response("nwc", Some(21), None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.min_sendable, 21_000);

        let above_max = engine
            .build_discovery_response("nwc", Some(2_000_001), None)
            .await
            .unwrap();
        assert!(above_max.is_none());
    }

    #[tokio::test]
    async fn test_discovery_unknown_user() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);
        assert!(
            engine
                .build_discovery_response("alice", None, None)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_callback_example() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        let response = engine
            .build_callback_response("nwc", 5000, "message", &thanks_for_zapping)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(funding.deposits(), vec![("nwc".to_owned(), 5)]);
        assert_eq!(response.pr, MOCK_INVOICE);
        assert!(response.routes.is_empty());
        let action = response.success_action.unwrap();
        assert_eq!(action.tag, "message");
        assert_eq!(action.message, "Thanks for zapping nwc");
    }

    #[tokio::test]
    async fn test_callback_rounds_up() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        engine
            .build_callback_response("nwc", 1001, "message", &thanks_for_zapping)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(funding.deposits(), vec![("nwc".to_owned(), 2)]);
    }

    #[tokio::test]
    async fn test_callback_rejects_out_of_bounds() {
        let config = LnurlConfig::new("d", 10, 100).unwrap();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        for amount_msat in [0, 1, 8_999, 9_000, 100_001, 101_000, u64::MAX] {
            let response = engine
                .build_callback_response("nwc", amount_msat, "message", &thanks_for_zapping)
                .await
                .unwrap();
            assert!(response.is_none(), "amount {amount_msat} should be rejected");
        }
        assert!(funding.deposits().is_empty());

        // 9_001 msat rounds up to the 10 sat minimum; 100_000 is the maximum.
        for amount_msat in [9_001, 10_000, 100_000] {
            assert!(
                engine
                    .build_callback_response("nwc", amount_msat, "message", &thanks_for_zapping)
                    .await
                    .unwrap()
                    .is_some()
            );
        }
    }

    #[tokio::test]
    async fn test_callback_unknown_user_regardless_of_amount() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);

        for amount_msat in [0, 5000, u64::MAX] {
            assert!(
                engine
                    .build_callback_response("bob", amount_msat, "message", &thanks_for_zapping)
                    .await
                    .unwrap()
                    .is_none()
            );
        }
        assert!(funding.deposits().is_empty());
    }

    #[tokio::test]
    async fn test_callback_empty_invoice_is_rejected() {
        let config = config();
        let funding = MockFunding::new("nwc").with_invoice("");
        let engine = PayRequestEngine::new(&config, &funding);

        let response = engine
            .build_callback_response("nwc", 5000, "message", &thanks_for_zapping)
            .await
            .unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_outage_is_an_error_not_an_unknown_user() {
        let config = config();
        let funding = MockFunding::new("nwc").unavailable();
        let engine = PayRequestEngine::new(&config, &funding);

        assert!(matches!(
            engine.build_discovery_response("nwc", None, None).await,
            Err(FundingError::BackendUnavailable(_))
        ));
        assert!(matches!(
            engine
                .build_callback_response("nwc", 5000, "message", &thanks_for_zapping)
                .await,
            Err(FundingError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_message_template() {
        let config = config();
        let funding = MockFunding::new("nwc");
        let engine = PayRequestEngine::new(&config, &funding);
        let template = |user: &str| format!("Payment to ln address for {user}");

        let response = engine
            .build_callback_response("nwc", 5000, "message", &template)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            response.success_action.unwrap().message,
            "Payment to ln address for nwc"
        );
    }
}
