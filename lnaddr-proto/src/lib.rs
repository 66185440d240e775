//! Wire format types for the LNURL protocol family.
//!
//! This crate defines the serialization-level data structures exchanged
//! between an LNURL service and Lightning wallets. Field names are fixed by
//! the LNURL documents (LUDs) and are not renameable. It has minimal
//! dependencies (only `serde` and `serde_json`) and is shared by every other
//! crate of the lnaddr stack.
//!
//! # Modules
//!
//! - [`pay`] - LUD-06 / LUD-16 `payRequest` responses
//! - [`withdraw`] - LUD-03 `withdrawRequest` responses
//! - [`status`] - `{status, reason}` acknowledgements and errors
//! - [`helpers`] - Tag detection and typed parsing of raw LNURL replies

pub mod helpers;
pub mod pay;
pub mod status;
pub mod withdraw;

pub use pay::{PayActionResponse, PayRequestResponse, SuccessAction};
pub use status::{GENERIC_REJECTION_REASON, Status, StatusResponse};
pub use withdraw::WithdrawRequestResponse;

/// Amount expressed in millisatoshis, the unit of every LNURL amount field.
pub type MilliSats = u64;

/// `tag` value of a LUD-06 / LUD-16 pay request.
pub const PAY_REQUEST_TAG: &str = "payRequest";

/// `tag` value of a LUD-03 withdraw request.
pub const WITHDRAW_REQUEST_TAG: &str = "withdrawRequest";

/// `tag` value of a LUD-09 plain-text success action.
pub const MESSAGE_TAG: &str = "message";

/// Errors that can occur when parsing LNURL protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The `tag` field is missing from the JSON data.
    #[error("missing tag field")]
    MissingTag,

    /// The `tag` field names a request kind this crate does not model.
    #[error("unsupported tag: {0}")]
    UnsupportedTag(String),

    /// The service answered with `{"status":"ERROR"}`.
    #[error("service error: {0}")]
    Service(String),

    /// JSON deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
