#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! LNURL protocol engine for Lightning addresses.
//!
//! This crate turns a human-readable `username@domain` Lightning address into
//! the responses wallets expect: the LUD-16 discovery document, the LUD-06
//! callback carrying a payable invoice, and the symmetric LUD-03 withdraw
//! offer. Invoice creation, balances and payouts are delegated to a pluggable
//! [`FundingSource`](funding::FundingSource).
//!
//! # Overview
//!
//! A wallet resolving `nwc@pay.example.com` first fetches the pay request,
//! which advertises the amount bounds and the canonical metadata. It then
//! calls back with an amount in millisatoshis and receives an invoice. The
//! engine validates amounts in whole satoshis, since that is the granularity
//! of the backend, and never asks the backend for an invoice it would reject.
//!
//! # Modules
//!
//! - [`address`] - Lightning address parsing and binding to a receiving identity
//! - [`amount`] - Satoshi / millisatoshi conversions
//! - [`config`] - Receiving domain and amount bounds
//! - [`error`] - Error and rejection types
//! - [`funding`] - Funding backend capability trait
//! - [`handler`] - Protocol facade and per-request context
//! - [`lnurl`] - Bech32 LNURL encoding
//! - [`metadata`] - Canonical LUD-06 metadata and its hash
//! - [`pay`] - LUD-06 / LUD-16 pay request engine
//! - [`withdraw`] - LUD-03 withdraw request engine
//!
//! # Feature Flags
//!
//! - `telemetry` - Wraps engine operations in tracing spans
//! - `test-utils` - Exposes [`testing::MockFunding`]

pub mod address;
pub mod amount;
pub mod config;
pub mod error;
pub mod funding;
pub mod handler;
pub mod lnurl;
pub mod metadata;
pub mod pay;
pub mod withdraw;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use address::{AddressResolver, BoundAddress, LightningAddress};
pub use config::LnurlConfig;
pub use error::{LnurlError, Rejection};
pub use funding::{FundingError, FundingSource, InvoiceDetails, Owner, WithdrawalReceipt};
pub use handler::{LnurlHandler, RequestContext};
pub use lnaddr_proto as proto;
pub use pay::PayRequestEngine;
pub use withdraw::WithdrawRequestEngine;
