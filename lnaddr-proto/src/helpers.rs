//! Utility functions for LNURL replies.
//!
//! Provides tag detection and typed parsing of raw first-step replies, which
//! may be either a request description or a `{"status":"ERROR"}` object.

use serde_json::Value;

use crate::{
    PAY_REQUEST_TAG, PayRequestResponse, ProtocolError, StatusResponse, WITHDRAW_REQUEST_TAG,
    WithdrawRequestResponse,
};

/// A decoded first-step LNURL reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LnurlResponse {
    /// LUD-06 / LUD-16 pay request.
    Pay(PayRequestResponse),
    /// LUD-03 withdraw request.
    Withdraw(WithdrawRequestResponse),
}

/// Extracts the `tag` field from JSON data.
///
/// # Errors
///
/// Returns [`ProtocolError::Service`] if the value is an `ERROR` status
/// reply, or [`ProtocolError::MissingTag`] if the field is absent.
pub fn detect_tag(data: &Value) -> Result<&str, ProtocolError> {
    if let Some(error) = service_error(data) {
        return Err(ProtocolError::Service(error));
    }
    data.get("tag")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingTag)
}

/// Parses a first-step reply from raw JSON bytes.
///
/// # Errors
///
/// Returns [`ProtocolError`] on malformed JSON, an `ERROR` reply, or an
/// unknown tag.
pub fn parse_response(data: &[u8]) -> Result<LnurlResponse, ProtocolError> {
    let value: Value = serde_json::from_slice(data)?;
    let tag = detect_tag(&value)?.to_owned();
    if tag == PAY_REQUEST_TAG {
        Ok(LnurlResponse::Pay(serde_json::from_value(value)?))
    } else if tag == WITHDRAW_REQUEST_TAG {
        Ok(LnurlResponse::Withdraw(serde_json::from_value(value)?))
    } else {
        Err(ProtocolError::UnsupportedTag(tag))
    }
}

/// Parses a reply that must be a pay request.
///
/// # Errors
///
/// Returns [`ProtocolError::UnsupportedTag`] if the reply is another kind.
pub fn parse_pay_request(data: &[u8]) -> Result<PayRequestResponse, ProtocolError> {
    match parse_response(data)? {
        LnurlResponse::Pay(pay) => Ok(pay),
        LnurlResponse::Withdraw(_) => Err(ProtocolError::UnsupportedTag(
            WITHDRAW_REQUEST_TAG.to_owned(),
        )),
    }
}

fn service_error(data: &Value) -> Option<String> {
    let status: StatusResponse = serde_json::from_value(data.clone()).ok()?;
    status
        .is_error()
        .then(|| status.reason.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pay_request() {
        let body = br#"{"callback":"https://d/lnurlp/u/callback","minSendable":1000,"maxSendable":2000,"metadata":"[]","tag":"payRequest"}"#;
        let parsed = parse_pay_request(body).unwrap();
        assert_eq!(parsed.min_sendable, 1000);
        assert_eq!(parsed.max_sendable, 2000);
    }

    #[test]
    fn test_parse_withdraw_request() {
        let body = br#"{"callback":"cb","k1":"00","defaultDescription":"d","minWithdrawable":0,"maxWithdrawable":5,"tag":"withdrawRequest"}"#;
        assert!(matches!(
            parse_response(body).unwrap(),
            LnurlResponse::Withdraw(_)
        ));
    }

    #[test]
    fn test_error_reply_is_surfaced() {
        let body = br#"{"status":"ERROR","reason":"nope"}"#;
        match parse_response(body) {
            Err(ProtocolError::Service(reason)) => assert_eq!(reason, "nope"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_missing_tag() {
        assert!(matches!(
            parse_response(br#"{"callback":"x"}"#),
            Err(ProtocolError::MissingTag)
        ));
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            parse_response(br#"{"tag":"login"}"#),
            Err(ProtocolError::UnsupportedTag(t)) if t == "login"
        ));
    }
}
