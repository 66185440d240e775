//! [`FundingSource`] over an NWC proxy service.
//!
//! The proxy exposes a single `POST /api/run-command` endpoint taking
//! `{"action": ..., "data": ...}` and answering `{"result": ...}`. It relays
//! each action to a Nostr Wallet Connect wallet, so it serves exactly one
//! receiving identity: the configured username.
//!
//! Invoices are decoded locally, without a round-trip to the proxy.

use std::time::Duration;

use lnaddr::amount::Sats;
use lnaddr::{FundingError, FundingSource, InvoiceDetails, Owner, WithdrawalReceipt};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT, DEFAULT_INVOICE_MEMO, GET_BALANCE_ACTION, MAKE_INVOICE_ACTION,
    RUN_COMMAND_PATH, SEND_PAYMENT_ACTION,
};
use crate::error::HttpError;
use crate::invoice::decode_bolt11;

/// Configuration for [`NwcProxyFunding`].
#[derive(Debug, Clone)]
pub struct NwcProxyConfig {
    /// Proxy base URL, e.g. `http://localhost:3000`.
    pub base_url: String,

    /// The single username served by the wallet.
    pub username: String,

    /// Memo attached to created invoices.
    pub memo: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Optional pre-configured reqwest client. If `None`, a new client is
    /// created with the configured timeout.
    pub http_client: Option<Client>,
}

impl NwcProxyConfig {
    /// Creates a config for `base_url` serving `username`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            memo: DEFAULT_INVOICE_MEMO.to_owned(),
            timeout: DEFAULT_HTTP_TIMEOUT,
            http_client: None,
        }
    }

    /// Sets the invoice memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// Wire format of a proxy command.
#[derive(Debug, Serialize)]
struct RunCommand<'a> {
    action: &'a str,
    data: Value,
}

/// Wire format of a proxy reply.
#[derive(Debug, Deserialize)]
struct RunCommandReply<R> {
    result: R,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MakeInvoiceResult {
    #[serde(default)]
    payment_request: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    balance: Sats,
}

#[derive(Debug, Deserialize)]
struct SendPaymentResult {
    #[serde(default)]
    preimage: Option<String>,
}

/// Funding source relaying to an NWC wallet through the proxy.
#[derive(Debug, Clone)]
pub struct NwcProxyFunding {
    run_command_url: Url,
    username: String,
    memo: String,
    client: Client,
}

impl NwcProxyFunding {
    /// Creates a funding source from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: NwcProxyConfig) -> Result<Self, HttpError> {
        // Keep any base path: "http://host/proxy" must resolve to "/proxy/api/run-command".
        let mut normalized = config.base_url.trim().trim_end_matches('/').to_owned();
        normalized.push('/');
        let base_url = Url::parse(&normalized).map_err(|e| HttpError::UrlParse {
            context: "Failed to parse proxy base url",
            source: e,
        })?;
        let run_command_url = base_url
            .join(RUN_COMMAND_PATH)
            .map_err(|e| HttpError::UrlParse {
                context: "Failed to construct run-command URL",
                source: e,
            })?;

        let client = match config.http_client {
            Some(client) => client,
            None => Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| HttpError::Http {
                    context: "Failed to build HTTP client",
                    source: e,
                })?,
        };

        Ok(Self {
            run_command_url,
            username: config.username,
            memo: config.memo,
            client,
        })
    }

    /// The computed `run-command` URL.
    #[must_use]
    pub const fn run_command_url(&self) -> &Url {
        &self.run_command_url
    }

    /// The username this wallet serves.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Creates an invoice for `amount_sats`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the proxy call fails.
    pub async fn make_invoice(&self, amount_sats: Sats) -> Result<String, HttpError> {
        let result: MakeInvoiceResult = self
            .run_command(
                MAKE_INVOICE_ACTION,
                json!({ "amount": amount_sats, "memo": self.memo }),
            )
            .await?;
        Ok(result.payment_request)
    }

    /// Reads the wallet balance.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the proxy call fails.
    pub async fn get_balance(&self) -> Result<Sats, HttpError> {
        let result: BalanceResult = self.run_command(GET_BALANCE_ACTION, Value::Null).await?;
        Ok(result.balance)
    }

    /// Pays `invoice` and returns the preimage, if reported.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the proxy call fails.
    pub async fn send_payment(&self, invoice: &str) -> Result<Option<String>, HttpError> {
        let result: SendPaymentResult = self
            .run_command(SEND_PAYMENT_ACTION, Value::String(invoice.to_owned()))
            .await?;
        Ok(result.preimage)
    }

    async fn run_command<R>(&self, action: &'static str, data: Value) -> Result<R, HttpError>
    where
        R: DeserializeOwned,
    {
        debug!(action, url = %self.run_command_url, "NWC proxy command");
        let response = self
            .client
            .post(self.run_command_url.clone())
            .json(&RunCommand { action, data })
            .send()
            .await
            .map_err(|e| HttpError::Http {
                context: action,
                source: e,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| HttpError::Http {
            context: action,
            source: e,
        })?;
        if !status.is_success() {
            return Err(HttpError::HttpStatus {
                context: action,
                status,
                body,
            });
        }

        let reply: RunCommandReply<R> =
            serde_json::from_str(&body).map_err(|e| HttpError::JsonDeserialization {
                context: action,
                source: e,
            })?;
        Ok(reply.result)
    }

    fn check_owner(&self, owner: &Owner) -> Result<(), FundingError> {
        if owner.id == self.username {
            Ok(())
        } else {
            Err(FundingError::UnknownOwner(owner.id.clone()))
        }
    }
}

#[async_trait::async_trait]
impl FundingSource for NwcProxyFunding {
    async fn get_owner(&self, identifier: &str) -> Result<Option<Owner>, FundingError> {
        Ok((identifier == self.username).then(|| Owner::new(identifier)))
    }

    async fn deposit_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
    ) -> Result<String, FundingError> {
        self.check_owner(owner)?;
        Ok(self.make_invoice(amount_sats).await?)
    }

    async fn withdraw_funds(
        &self,
        owner: &Owner,
        amount_sats: Sats,
        invoice: &str,
    ) -> Result<WithdrawalReceipt, FundingError> {
        self.check_owner(owner)?;
        let balance_sats = self.get_balance().await?;
        if amount_sats > balance_sats {
            warn!(owner = %owner.id, amount_sats, balance_sats, "Withdrawal exceeds balance");
            return Err(FundingError::InvalidAmount(amount_sats));
        }
        let preimage = self.send_payment(invoice).await?;
        info!(owner = %owner.id, amount_sats, "Paid invoice through NWC proxy");
        Ok(WithdrawalReceipt {
            amount_sats,
            preimage,
        })
    }

    async fn decode_invoice(&self, invoice: &str) -> Result<InvoiceDetails, FundingError> {
        decode_bolt11(invoice)
    }

    async fn account_balance(&self) -> Result<Sats, FundingError> {
        Ok(self.get_balance().await?)
    }
}
