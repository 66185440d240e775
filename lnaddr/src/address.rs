//! Lightning addresses and their binding to a receiving identity.
//!
//! A Lightning address looks like an email address, `username@domain`. This
//! server answers for exactly one domain, so inbound identifiers are reduced
//! to their username part and re-qualified with the configured domain once
//! the backend confirms the user exists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LnurlError;
use crate::funding::{FundingError, FundingSource, Owner};

/// A `username@domain` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LightningAddress {
    username: String,
    domain: String,
}

/// Discovery URLs derived from a Lightning address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownUrls {
    /// LUD-16 pay request endpoint.
    pub lnurlp: String,
    /// Keysend endpoint.
    pub keysend: String,
    /// NIP-05 `nostr.json` lookup.
    pub nostr: String,
}

impl LightningAddress {
    /// Creates an address from its parts without validation.
    #[must_use]
    pub fn new(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            domain: domain.into(),
        }
    }

    /// Parses `username@domain`.
    ///
    /// # Errors
    ///
    /// Returns [`LnurlError::InvalidAddress`] unless the identifier splits
    /// into exactly two non-empty parts.
    pub fn parse(identifier: &str) -> Result<Self, LnurlError> {
        let mut parts = identifier.trim().split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(username), Some(domain), None) if !username.is_empty() && !domain.is_empty() => {
                Ok(Self::new(username, domain))
            }
            _ => Err(LnurlError::InvalidAddress(identifier.to_owned())),
        }
    }

    /// The part before `@`.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The part after `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Discovery URLs served by the address's domain.
    ///
    /// `dev` selects plain `http`, for local services.
    #[must_use]
    pub fn well_known_urls(&self, dev: bool) -> WellKnownUrls {
        let protocol = if dev { "http" } else { "https" };
        let Self { username, domain } = self;
        WellKnownUrls {
            lnurlp: format!("{protocol}://{domain}/.well-known/lnurlp/{username}"),
            keysend: format!("{protocol}://{domain}/.well-known/keysend/{username}"),
            nostr: format!("{protocol}://{domain}/.well-known/nostr.json?name={username}"),
        }
    }
}

impl fmt::Display for LightningAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.domain)
    }
}

impl FromStr for LightningAddress {
    type Err = LnurlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Returns the username part of `username` or `username@anything`.
#[must_use]
pub fn parse_username(identifier: &str) -> &str {
    identifier
        .split('@')
        .next()
        .unwrap_or_default()
        .trim()
}

/// A username the backend confirmed, qualified with the configured domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundAddress {
    /// Backend handle for the identity.
    pub owner: Owner,
    /// Canonical `username@configured_domain`.
    pub address: LightningAddress,
}

/// Resolves identifiers against the configured domain.
#[derive(Debug, Clone, Copy)]
pub struct AddressResolver<'a> {
    domain: &'a str,
}

impl<'a> AddressResolver<'a> {
    /// Creates a resolver for `domain`.
    #[must_use]
    pub const fn new(domain: &'a str) -> Self {
        Self { domain }
    }

    /// Strips any `@domain` suffix. The suffix is ignored since only one
    /// domain is served.
    #[must_use]
    pub fn resolve(self, identifier: &str) -> String {
        parse_username(identifier).to_owned()
    }

    /// Confirms `username` with the backend.
    ///
    /// Returns `None` for unknown users, including the empty username, which
    /// is never sent to the backend.
    ///
    /// # Errors
    ///
    /// Propagates backend failures, so an outage is not mistaken for an
    /// unknown user.
    pub async fn bind<F>(
        self,
        funding: &F,
        username: &str,
    ) -> Result<Option<BoundAddress>, FundingError>
    where
        F: FundingSource + ?Sized,
    {
        if username.is_empty() {
            return Ok(None);
        }
        let owner = funding.get_owner(username).await?;
        Ok(owner.map(|owner| BoundAddress {
            owner,
            address: LightningAddress::new(username, self.domain),
        }))
    }
}
