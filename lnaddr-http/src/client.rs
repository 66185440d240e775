//! Client side of LNURL: resolving remote Lightning addresses and LNURLs.

use std::time::Duration;

use lnaddr::LightningAddress;
use lnaddr::proto::PayRequestResponse;
use lnaddr::proto::helpers::{LnurlResponse, parse_pay_request, parse_response};
use reqwest::Client;

use crate::constants::DEFAULT_HTTP_TIMEOUT;
use crate::error::HttpError;

/// Fetches LNURL documents from remote services.
#[derive(Debug, Clone)]
pub struct LnurlClient {
    client: Client,
    dev: bool,
}

impl LnurlClient {
    /// Creates a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a client with the given timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Http`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Http {
                context: "Failed to build HTTP client",
                source: e,
            })?;
        Ok(Self::with_client(client))
    }

    /// Wraps a pre-configured reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client, dev: false }
    }

    /// Resolves addresses over plain `http`, for local services.
    #[must_use]
    pub const fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// GETs `url` and returns the raw body.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::HttpStatus`] for any status of 300 or above.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let context = "GET lnurl";
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HttpError::Http { context, source: e })?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::HttpStatus {
                context,
                status,
                body,
            });
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::Http { context, source: e })?;
        Ok(bytes.to_vec())
    }

    /// GETs `url` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] on transport failures, statuses of 300 or above,
    /// or a body that is not JSON.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, HttpError> {
        let bytes = self.get_bytes(url).await?;
        serde_json::from_slice(&bytes).map_err(|e| HttpError::JsonDeserialization {
            context: "GET lnurl",
            source: e,
        })
    }

    /// Fetches the LUD-16 pay request of `identifier` (`user@domain`).
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the identifier is not an address, the fetch
    /// fails, or the service answers with something other than a pay request.
    pub async fn fetch_pay_request(
        &self,
        identifier: &str,
    ) -> Result<PayRequestResponse, HttpError> {
        let address = LightningAddress::parse(identifier)?;
        let url = address.well_known_urls(self.dev).lnurlp;
        tracing::debug!(%address, %url, "Resolving lightning address");
        let bytes = self.get_bytes(&url).await?;
        Ok(parse_pay_request(&bytes)?)
    }

    /// Decodes a bech32 LNURL and fetches the document it points at.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the LNURL does not decode, the fetch fails,
    /// or the reply is not a supported LNURL document.
    pub async fn fetch_lnurl(&self, lnurl: &str) -> Result<LnurlResponse, HttpError> {
        let url = lnaddr::lnurl::decode(lnurl)?;
        let bytes = self.get_bytes(&url).await?;
        Ok(parse_response(&bytes)?)
    }
}
