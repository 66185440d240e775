//! HTTP integrations for the lnaddr engine.
//!
//! Provides a [`FundingSource`](lnaddr::FundingSource) backed by an NWC proxy
//! service and a client for resolving remote Lightning addresses.
//!
//! # Modules
//!
//! - [`constants`] - Endpoint paths and defaults
//! - [`error`] - HTTP transport error types
//! - [`invoice`] - Local BOLT-11 decoding
//! - [`nwc`] - Funding source over the NWC proxy `run-command` API
//! - [`client`] - LUD-16 / LNURL resolution of remote services

pub mod client;
pub mod constants;
pub mod error;
pub mod invoice;
pub mod nwc;

pub use client::LnurlClient;
pub use error::HttpError;
pub use nwc::{NwcProxyConfig, NwcProxyFunding};
