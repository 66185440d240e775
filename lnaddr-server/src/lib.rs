//! Lightning address server.
//!
//! Serves LUD-16 discovery, the LUD-06 pay callback and LUD-03 withdrawals
//! for one configured `username@domain`, backed by an NWC proxy.
//!
//! # Modules
//!
//! - [`handlers`] - Axum route handlers and router builder
//! - [`error`] - Endpoint error types
//! - [`config`] - Server configuration with environment variable expansion
//! - [`session`] - Single-use withdraw tokens

pub mod config;
pub mod error;
pub mod handlers;
pub mod session;

pub use handlers::{AppState, lnurl_router};
