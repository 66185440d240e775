//! Server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8000
//! domain = "$LN_ADDRESS_DOMAIN"
//! username = "nwc"
//! min_sats = 1
//! max_sats = 2000000
//! node_base_url = "http://localhost:3000"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to configuration file (default: `config.toml`)
//! - `HOST` - Override server bind address
//! - `PORT` - Override server port
//! - `LN_ADDRESS_DOMAIN` - Override the served domain
//! - `LN_USERNAME` - Override the served username
//! - `NODE_BASE_URL` - Override the NWC proxy base URL
//! - `WITHDRAW_TOKEN` - Secret required to request withdraw offers

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;

use lnaddr::amount::Sats;
use lnaddr::config::{DEFAULT_MAX_SATS, DEFAULT_MIN_SATS};
use lnaddr::withdraw::DEFAULT_FEE_RESERVE_SATS;
use lnaddr::{LnurlConfig, LnurlError};
use serde::{Deserialize, Serialize};

/// Errors raised while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Configuration file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`ServerConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values do not form a usable engine configuration.
    #[error(transparent)]
    Invalid(#[from] LnurlError),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `8000`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Domain of the served Lightning address.
    #[serde(default)]
    pub domain: String,

    /// Username of the served Lightning address (default: `nwc`).
    #[serde(default = "default_username")]
    pub username: String,

    /// Smallest receivable amount in sats.
    #[serde(default = "default_min_sats")]
    pub min_sats: Sats,

    /// Largest receivable amount in sats.
    #[serde(default = "default_max_sats")]
    pub max_sats: Sats,

    /// Base URL of the NWC proxy.
    #[serde(default = "default_node_base_url")]
    pub node_base_url: String,

    /// Per-call funding backend timeout.
    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,

    /// Lifetime of an issued withdraw `k1`.
    #[serde(default = "default_k1_ttl_secs")]
    pub k1_ttl_secs: u64,

    /// Sats reserved for routing fees on withdrawals.
    #[serde(default = "default_fee_reserve_sats")]
    pub fee_reserve_sats: Sats,

    /// Secret a client must present to obtain a withdraw offer.
    ///
    /// Withdrawals are disabled while unset.
    #[serde(default)]
    pub withdraw_token: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_port() -> u16 {
    8000
}

fn default_username() -> String {
    "nwc".to_owned()
}

const fn default_min_sats() -> Sats {
    DEFAULT_MIN_SATS
}

const fn default_max_sats() -> Sats {
    DEFAULT_MAX_SATS
}

fn default_node_base_url() -> String {
    "http://localhost:3000".to_owned()
}

const fn default_backend_timeout_secs() -> u64 {
    30
}

const fn default_k1_ttl_secs() -> u64 {
    300
}

const fn default_fee_reserve_sats() -> Sats {
    DEFAULT_FEE_RESERVE_SATS
}

impl ServerConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is treated as empty, so defaults and environment
    /// overrides apply.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        Self::from_toml(&content, |name| std::env::var(name).ok())
    }

    /// Parses `content` after expanding variables, then applies overrides,
    /// both resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML.
    pub fn from_toml(
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(content, &lookup);
        let mut config: Self = toml::from_str(&expanded)?;
        config.apply_overrides(&lookup);
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("HOST").and_then(|h| h.parse().ok()) {
            self.host = addr;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(domain) = lookup("LN_ADDRESS_DOMAIN").filter(|d| !d.is_empty()) {
            self.domain = domain;
        }
        if let Some(username) = lookup("LN_USERNAME").filter(|u| !u.is_empty()) {
            self.username = username;
        }
        if let Some(url) = lookup("NODE_BASE_URL").filter(|u| !u.is_empty()) {
            self.node_base_url = url;
        }
        if let Some(token) = lookup("WITHDRAW_TOKEN") {
            self.withdraw_token = Some(token);
        }
        // An empty secret would match an empty query value.
        self.withdraw_token = self
            .withdraw_token
            .take()
            .filter(|token| !token.trim().is_empty());
    }

    /// Returns `true` if withdraw offers can be requested.
    #[must_use]
    pub const fn withdrawals_enabled(&self) -> bool {
        self.withdraw_token.is_some()
    }

    /// Engine configuration derived from the domain and bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the domain is missing or the
    /// bounds are inconsistent.
    pub fn lnurl_config(&self) -> Result<LnurlConfig, ConfigError> {
        Ok(LnurlConfig::new(
            self.domain.clone(),
            self.min_sats,
            self.max_sats,
        )?)
    }

    /// Funding backend timeout.
    #[must_use]
    pub const fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    /// Lifetime of an issued `k1`.
    #[must_use]
    pub const fn k1_ttl(&self) -> Duration {
        Duration::from_secs(self.k1_ttl_secs)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string using `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut var_name = String::new();
        while let Some(&c) = chars.peek() {
            if braced {
                if c == '}' {
                    chars.next();
                    break;
                }
            } else if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            var_name.push(c);
            chars.next();
        }

        match lookup(&var_name).filter(|_| !var_name.is_empty()) {
            Some(value) => result.push_str(&value),
            None if braced => {
                result.push_str("${");
                result.push_str(&var_name);
                if !var_name.is_empty() {
                    result.push('}');
                }
            }
            None => {
                result.push('$');
                result.push_str(&var_name);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_toml("", env(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.username, "nwc");
        assert_eq!(config.min_sats, 1);
        assert_eq!(config.max_sats, 2_000_000);
        assert_eq!(config.fee_reserve_sats, 100);
        assert_eq!(config.backend_timeout(), Duration::from_secs(30));
        assert_eq!(config.k1_ttl(), Duration::from_secs(300));
        assert!(config.lnurl_config().is_err());
        assert!(!config.withdrawals_enabled());
    }

    #[test]
    fn test_withdraw_token() {
        let config =
            ServerConfig::from_toml(r#"withdraw_token = "$SECRET""#, env(&[("SECRET", "s3cret")]))
                .unwrap();
        assert_eq!(config.withdraw_token.as_deref(), Some("s3cret"));
        assert!(config.withdrawals_enabled());

        let config =
            ServerConfig::from_toml(r#"withdraw_token = "file""#, env(&[("WITHDRAW_TOKEN", "env")]))
                .unwrap();
        assert_eq!(config.withdraw_token.as_deref(), Some("env"));
    }

    #[test]
    fn test_blank_withdraw_token_disables_withdrawals() {
        let config = ServerConfig::from_toml(r#"withdraw_token = "  ""#, env(&[])).unwrap();
        assert!(!config.withdrawals_enabled());

        let config =
            ServerConfig::from_toml(r#"withdraw_token = "file""#, env(&[("WITHDRAW_TOKEN", "")]))
                .unwrap();
        assert!(!config.withdrawals_enabled());
    }

    #[test]
    fn test_expansion_and_overrides() {
        let toml = r#"
            domain = "${DOMAIN}"
            node_base_url = "$NODE"
            port = 9000
        "#;
        let config = ServerConfig::from_toml(
            toml,
            env(&[
                ("DOMAIN", "pay.example.com"),
                ("NODE", "http://proxy:3000"),
                ("PORT", "8080"),
                ("LN_USERNAME", "alice"),
            ]),
        )
        .unwrap();
        assert_eq!(config.domain, "pay.example.com");
        assert_eq!(config.node_base_url, "http://proxy:3000");
        assert_eq!(config.port, 8080);
        assert_eq!(config.username, "alice");
        assert_eq!(config.lnurl_config().unwrap().base_url(), "https://pay.example.com");
    }

    #[test]
    fn test_env_domain_overrides_file() {
        let config = ServerConfig::from_toml(
            r#"domain = "file.example""#,
            env(&[("LN_ADDRESS_DOMAIN", "env.example")]),
        )
        .unwrap();
        assert_eq!(config.domain, "env.example");
    }

    #[test]
    fn test_unresolved_variables_are_kept() {
        let lookup = env(&[("A", "1")]);
        assert_eq!(expand_env_vars("$A ${A} $B ${B}", &lookup), "1 1 $B ${B}");
        assert_eq!(expand_env_vars("cost: $5 and $", &lookup), "cost: $5 and $");
    }

    #[test]
    fn test_invalid_bounds() {
        let config = ServerConfig::from_toml(
            "domain = \"d\"\nmin_sats = 10\nmax_sats = 5",
            env(&[]),
        )
        .unwrap();
        assert!(matches!(config.lnurl_config(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load_from("/nonexistent/lnaddr.toml").unwrap();
        assert_eq!(config.min_sats, 1);
    }
}
