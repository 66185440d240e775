//! `payRequest` wire types (LUD-06 and LUD-16).

use serde::{Deserialize, Serialize};

use crate::{MESSAGE_TAG, MilliSats, PAY_REQUEST_TAG};

/// First-step response of a pay request, served for a Lightning address.
///
/// # JSON Format
///
/// ```json
/// {
///   "callback": "https://pay.example.com/lnurlp/nwc/callback",
///   "minSendable": 1000,
///   "maxSendable": 2000000000,
///   "metadata": "[[\"text/plain\", \"Zap nwc some sats\"], [\"text/identifier\", \"nwc@pay.example.com\"]]",
///   "tag": "payRequest"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequestResponse {
    /// URL the wallet calls with the chosen `amount`.
    pub callback: String,

    /// Smallest accepted amount.
    pub min_sendable: MilliSats,

    /// Largest accepted amount.
    pub max_sendable: MilliSats,

    /// Canonical metadata string. Wallets hash it verbatim.
    pub metadata: String,

    /// Always `payRequest`.
    #[serde(default = "pay_request_tag")]
    pub tag: String,
}

fn pay_request_tag() -> String {
    PAY_REQUEST_TAG.to_owned()
}

impl PayRequestResponse {
    /// Creates a pay request response with the `payRequest` tag.
    #[must_use]
    pub fn new(
        callback: impl Into<String>,
        min_sendable: MilliSats,
        max_sendable: MilliSats,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            callback: callback.into(),
            min_sendable,
            max_sendable,
            metadata: metadata.into(),
            tag: pay_request_tag(),
        }
    }

    /// Returns `true` if `amount` lies within the advertised bounds.
    #[must_use]
    pub const fn accepts(&self, amount: MilliSats) -> bool {
        amount >= self.min_sendable && amount <= self.max_sendable
    }
}

/// Action a wallet performs once the invoice is paid (LUD-09).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessAction {
    /// Action kind, normally `message`.
    pub tag: String,

    /// Text shown to the payer.
    pub message: String,
}

impl SuccessAction {
    /// Creates a plain `message` success action.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            tag: MESSAGE_TAG.to_owned(),
            message: message.into(),
        }
    }
}

/// Second-step response of a pay request, carrying the invoice.
///
/// `routes` is always serialized as an empty array since routing hints are
/// not offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayActionResponse {
    /// BOLT-11 payment request.
    pub pr: String,

    /// Action to show after payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_action: Option<SuccessAction>,

    /// Always empty.
    #[serde(default)]
    pub routes: Vec<Vec<serde_json::Value>>,
}

impl PayActionResponse {
    /// Creates a response for `pr` with an optional success action.
    #[must_use]
    pub fn new(pr: impl Into<String>, success_action: Option<SuccessAction>) -> Self {
        Self {
            pr: pr.into(),
            success_action,
            routes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_request_field_names() {
        let response = PayRequestResponse::new("https://a.b/lnurlp/x/callback", 1000, 5000, "[]");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["callback"], "https://a.b/lnurlp/x/callback");
        assert_eq!(value["minSendable"], 1000);
        assert_eq!(value["maxSendable"], 5000);
        assert_eq!(value["metadata"], "[]");
        assert_eq!(value["tag"], "payRequest");
    }

    #[test]
    fn test_pay_request_tag_defaults_when_absent() {
        let json = r#"{"callback":"c","minSendable":1,"maxSendable":2,"metadata":"[]"}"#;
        let parsed: PayRequestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.tag, PAY_REQUEST_TAG);
    }

    #[test]
    fn test_accepts_is_inclusive() {
        let response = PayRequestResponse::new("c", 1000, 5000, "[]");
        assert!(response.accepts(1000));
        assert!(response.accepts(5000));
        assert!(!response.accepts(999));
        assert!(!response.accepts(5001));
    }

    #[test]
    fn test_pay_action_routes_always_empty() {
        let response =
            PayActionResponse::new("lnbc1", Some(SuccessAction::message("Thanks for zapping nwc")));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["pr"], "lnbc1");
        assert_eq!(value["routes"], serde_json::json!([]));
        assert_eq!(value["successAction"]["tag"], "message");
        assert_eq!(value["successAction"]["message"], "Thanks for zapping nwc");
    }

    #[test]
    fn test_pay_action_without_success_action() {
        let response = PayActionResponse::new("lnbc1", None);
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("successAction").is_none());
    }
}
