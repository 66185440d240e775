//! `withdrawRequest` wire types (LUD-03).

use serde::{Deserialize, Serialize};

use crate::{MilliSats, WITHDRAW_REQUEST_TAG};

/// Withdraw offer handed to a wallet.
///
/// `k1` is a single-use token; the wallet echoes it back together with its
/// own invoice when calling `callback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequestResponse {
    /// URL the wallet calls with `k1` and `pr`.
    pub callback: String,

    /// 32-byte hex anti-replay token.
    pub k1: String,

    /// Description the wallet should put in its invoice.
    pub default_description: String,

    /// Smallest withdrawable amount.
    pub min_withdrawable: MilliSats,

    /// Largest withdrawable amount.
    pub max_withdrawable: MilliSats,

    /// Always `withdrawRequest`.
    #[serde(default = "withdraw_request_tag")]
    pub tag: String,
}

fn withdraw_request_tag() -> String {
    WITHDRAW_REQUEST_TAG.to_owned()
}

impl WithdrawRequestResponse {
    /// Creates a withdraw offer with the `withdrawRequest` tag.
    #[must_use]
    pub fn new(
        callback: impl Into<String>,
        k1: impl Into<String>,
        default_description: impl Into<String>,
        min_withdrawable: MilliSats,
        max_withdrawable: MilliSats,
    ) -> Self {
        Self {
            callback: callback.into(),
            k1: k1.into(),
            default_description: default_description.into(),
            min_withdrawable,
            max_withdrawable,
            tag: withdraw_request_tag(),
        }
    }
}
