//! `{status, reason}` replies shared by all LNURL endpoints.

use serde::{Deserialize, Serialize};

/// Reason sent to wallets for every rejected request.
///
/// Rejection details only go to server logs; wallets have no standard way to
/// render finer-grained reasons.
pub const GENERIC_REJECTION_REASON: &str =
    "could not process request. please try again with valid parameters";

/// Outcome marker of a status reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Request accepted.
    Ok,
    /// Request rejected.
    Error,
}

/// Acknowledgement or error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// `OK` or `ERROR`.
    pub status: Status,

    /// Present on errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusResponse {
    /// Creates an `{"status":"OK"}` reply.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: Status::Ok,
            reason: None,
        }
    }

    /// Creates an `{"status":"ERROR","reason":...}` reply.
    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            reason: Some(reason.into()),
        }
    }

    /// Creates an error reply carrying [`GENERIC_REJECTION_REASON`].
    #[must_use]
    pub fn rejected() -> Self {
        Self::error(GENERIC_REJECTION_REASON)
    }

    /// Returns `true` for `ERROR` replies.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}
