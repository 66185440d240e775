//! Configuration of the receiving identity.
//!
//! All bounds are whole satoshis; conversion to millisatoshis happens when a
//! response is built.

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::amount::{Sats, checked_sats_to_msat};
use crate::error::LnurlError;

/// Default smallest receivable amount.
pub const DEFAULT_MIN_SATS: Sats = 1;

/// Default largest receivable amount (0.02 BTC).
pub const DEFAULT_MAX_SATS: Sats = 2_000_000;

/// Domain and amount bounds the engine answers for.
///
/// # Example
///
/// ```rust
/// use lnaddr::config::LnurlConfig;
///
/// let config = LnurlConfig::new("pay.example.com", 1, 2_000_000).unwrap();
/// assert_eq!(config.base_url(), "https://pay.example.com");
/// ```
///
/// Deserialization runs the same checks as [`LnurlConfig::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LnurlConfig {
    domain: String,
    min_sats: Sats,
    max_sats: Sats,
}

impl LnurlConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LnurlError::InvalidConfig`] if the domain is empty,
    /// `min_sats` is zero, `max_sats < min_sats`, or `max_sats` does not fit
    /// in millisatoshis.
    pub fn new(
        domain: impl Into<String>,
        min_sats: Sats,
        max_sats: Sats,
    ) -> Result<Self, LnurlError> {
        let domain = domain.into().trim().trim_end_matches('/').to_owned();
        if domain.is_empty() {
            return Err(LnurlError::InvalidConfig("domain must not be empty".into()));
        }
        if min_sats == 0 {
            return Err(LnurlError::InvalidConfig("min_sats must be at least 1".into()));
        }
        if max_sats < min_sats {
            return Err(LnurlError::InvalidConfig(format!(
                "max_sats ({max_sats}) is below min_sats ({min_sats})"
            )));
        }
        if checked_sats_to_msat(max_sats).is_none() {
            return Err(LnurlError::InvalidConfig(format!(
                "max_sats ({max_sats}) overflows millisatoshis"
            )));
        }
        Ok(Self {
            domain,
            min_sats,
            max_sats,
        })
    }

    /// Creates a configuration with the default bounds.
    ///
    /// # Errors
    ///
    /// Returns [`LnurlError::InvalidConfig`] if the domain is empty.
    pub fn with_default_bounds(domain: impl Into<String>) -> Result<Self, LnurlError> {
        Self::new(domain, DEFAULT_MIN_SATS, DEFAULT_MAX_SATS)
    }

    /// The domain this server answers for.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Smallest receivable amount.
    #[must_use]
    pub const fn min_sats(&self) -> Sats {
        self.min_sats
    }

    /// Largest receivable amount.
    #[must_use]
    pub const fn max_sats(&self) -> Sats {
        self.max_sats
    }

    /// `https://{domain}`.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }
}

impl<'de> Deserialize<'de> for LnurlConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Fields {
            domain: String,
            #[serde(default = "default_min_sats")]
            min_sats: Sats,
            #[serde(default = "default_max_sats")]
            max_sats: Sats,
        }

        const fn default_min_sats() -> Sats {
            DEFAULT_MIN_SATS
        }

        const fn default_max_sats() -> Sats {
            DEFAULT_MAX_SATS
        }

        let fields = Fields::deserialize(deserializer)?;
        Self::new(fields.domain, fields.min_sats, fields.max_sats).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(matches!(
            LnurlConfig::new("d", 10, 9),
            Err(LnurlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_zero_min() {
        assert!(LnurlConfig::new("d", 0, 9).is_err());
    }

    #[test]
    fn test_rejects_empty_domain() {
        assert!(LnurlConfig::new("  ", 1, 9).is_err());
    }

    #[test]
    fn test_rejects_msat_overflow() {
        assert!(LnurlConfig::new("d", 1, u64::MAX).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let config: LnurlConfig =
            serde_json::from_str(r#"{"domain":"pay.example.com","min_sats":5,"max_sats":10}"#)
                .unwrap();
        assert_eq!(config, LnurlConfig::new("pay.example.com", 5, 10).unwrap());

        let config: LnurlConfig = serde_json::from_str(r#"{"domain":"pay.example.com"}"#).unwrap();
        assert_eq!(config.min_sats(), DEFAULT_MIN_SATS);
        assert_eq!(config.max_sats(), DEFAULT_MAX_SATS);

        for invalid in [
            r#"{"domain":"d","min_sats":0,"max_sats":9}"#,
            r#"{"domain":"d","min_sats":10,"max_sats":9}"#,
            r#"{"domain":"d","min_sats":1,"max_sats":18446744073709551615}"#,
            r#"{"domain":"","min_sats":1,"max_sats":9}"#,
        ] {
            assert!(serde_json::from_str::<LnurlConfig>(invalid).is_err(), "{invalid}");
        }
    }

    #[test]
    fn test_serialized_config_reloads() {
        let config = LnurlConfig::new("pay.example.com", 1, 2_000_000).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<LnurlConfig>(&json).unwrap(), config);
    }

    #[test]
    fn test_trailing_slash_is_dropped() {
        let config = LnurlConfig::new("pay.example.com/", 1, 1).unwrap();
        assert_eq!(config.base_url(), "https://pay.example.com");
    }
}
