//! Axum route handlers for the Lightning address service.
//!
//! Query parameters are taken as strings and parsed here, so malformed
//! values get the same generic LNURL error body as every other rejection.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use lnaddr::LnurlHandler;
use lnaddr::address::parse_username;
use lnaddr::amount::{MilliSats, Sats};
use lnaddr::proto::StatusResponse;
use serde::Deserialize;
use serde_json::json;

use crate::error::ServerError;
use crate::session::K1Store;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Protocol facade.
    pub handler: Arc<LnurlHandler>,
    /// Issued withdraw tokens.
    pub k1_store: Arc<K1Store>,
    /// Sats reserved for routing fees on withdrawals.
    pub fee_reserve_sats: Sats,
    /// Secret guarding withdraw offers; `None` disables withdrawals.
    pub withdraw_token: Option<Arc<str>>,
}

/// Query of the pay request endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PayRequestQuery {
    /// Minimum amount override, in sats.
    pub amount: Option<String>,
    /// Description override.
    pub description: Option<String>,
    /// Any non-empty value requests the bech32 LNURL instead.
    pub encode: Option<String>,
}

/// Query of the pay callback.
#[derive(Debug, Default, Deserialize)]
pub struct PayCallbackQuery {
    /// Amount in millisatoshis.
    pub amount: Option<String>,
}

/// Query of the withdraw request endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct WithdrawRequestQuery {
    /// Description the wallet should use.
    pub description: Option<String>,
    /// Withdraw secret.
    pub token: Option<String>,
}

/// Query of the withdraw callback.
#[derive(Debug, Default, Deserialize)]
pub struct WithdrawCallbackQuery {
    /// Token from the withdraw offer.
    pub k1: Option<String>,
    /// Invoice to pay.
    pub pr: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Compares in time independent of where the inputs first differ.
fn token_matches(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn authorize_withdraw(state: &AppState, token: Option<&str>) -> Result<(), ServerError> {
    let Some(expected) = state.withdraw_token.as_deref() else {
        tracing::warn!("LUD-03 offer requested but withdrawals are disabled");
        return Err(ServerError::Unauthorized);
    };
    match token {
        Some(given) if token_matches(expected, given) => Ok(()),
        _ => {
            tracing::warn!("LUD-03 offer requested with a missing or wrong token");
            Err(ServerError::Unauthorized)
        }
    }
}

fn parse_amount(value: Option<&str>) -> Result<Option<u64>, ServerError> {
    non_empty(value)
        .map(|v| v.parse::<u64>().map_err(|_| ServerError::Rejected))
        .transpose()
}

/// `GET /` - Welcome message.
pub async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the Node Remote API" }))
}

/// `GET /health` - Health check.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /lnurlp/{username}` and `GET /.well-known/lnurlp/{username}` -
/// LUD-16 pay request, or its bech32 LNURL when `encode` is set.
///
/// # Errors
///
/// Returns 400 for unknown users or bad parameters, 502 if the backend is
/// down.
pub async fn get_pay_request(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PayRequestQuery>,
) -> Result<Response, ServerError> {
    let amount_sats: Option<Sats> = parse_amount(query.amount.as_deref())?;
    let description = non_empty(query.description.as_deref());

    let response = state
        .handler
        .get_ln_details(&username, amount_sats, description)
        .await?
        .ok_or(ServerError::Rejected)?;

    if non_empty(query.encode.as_deref()).is_some() {
        let ln = state
            .handler
            .encoded_pay_link(parse_username(&username), amount_sats, description)?;
        return Ok(Json(json!({ "ln": ln })).into_response());
    }
    Ok(Json(response).into_response())
}

/// `GET /lnurlp/{username}/callback?amount=<msat>` - LUD-06 invoice.
///
/// # Errors
///
/// Returns 400 for unknown users, a missing or out-of-bounds amount, or no
/// invoice; 502 if the backend is down.
pub async fn get_pay_callback(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PayCallbackQuery>,
) -> Result<Response, ServerError> {
    let amount_msat: MilliSats =
        parse_amount(query.amount.as_deref())?.ok_or(ServerError::Rejected)?;
    let response = state
        .handler
        .generate_invoice(&username, amount_msat)
        .await?
        .ok_or(ServerError::Rejected)?;
    Ok(Json(response).into_response())
}

/// `GET /lnurlw/{username}?token=..` - LUD-03 withdraw offer.
///
/// Only holders of the configured withdraw token get a `k1`.
///
/// # Errors
///
/// Returns 401 without a valid token or when withdrawals are disabled, 400
/// for unknown users, 502 if the backend is down.
pub async fn get_withdraw_request(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<WithdrawRequestQuery>,
) -> Result<Response, ServerError> {
    authorize_withdraw(&state, query.token.as_deref())?;
    let offer = state
        .handler
        .withdraw_offer(&username, non_empty(query.description.as_deref()))
        .await?
        .ok_or(ServerError::Rejected)?;
    state
        .k1_store
        .issue(offer.k1.clone(), parse_username(&username));
    Ok(Json(offer).into_response())
}

/// `GET /lnurlw/{username}/callback?k1=..&pr=..` - Pays the wallet invoice.
///
/// # Errors
///
/// Returns 400 for unknown, reused or expired `k1`, a bad invoice, or an
/// unknown user; 502 if the backend is down.
pub async fn get_withdraw_callback(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<WithdrawCallbackQuery>,
) -> Result<Response, ServerError> {
    let k1 = non_empty(query.k1.as_deref()).ok_or(ServerError::Rejected)?;
    let invoice = non_empty(query.pr.as_deref()).ok_or(ServerError::Rejected)?;

    let Some(issued_to) = state.k1_store.consume(k1) else {
        tracing::warn!(%username, "LUD-03 callback with unknown or expired k1");
        return Err(ServerError::Rejected);
    };
    let username = parse_username(&username);
    if issued_to != username {
        tracing::warn!(username, %issued_to, "LUD-03 callback k1 issued to another user");
        return Err(ServerError::Rejected);
    }

    let receipt = state
        .handler
        .initiate_withdrawal(username, invoice, state.fee_reserve_sats)
        .await?
        .ok_or(ServerError::Rejected)?;
    tracing::info!(username, amount_sats = receipt.amount_sats, "LUD-03 withdrawal paid");
    Ok(Json(StatusResponse::ok()).into_response())
}

/// Creates an Axum [`axum::Router`] with all endpoints.
///
/// Endpoints:
/// - `GET /` - welcome message
/// - `GET /health` - health check
/// - `GET /lnurlp/{username}` - pay request
/// - `GET /.well-known/lnurlp/{username}` - pay request (LUD-16)
/// - `GET /lnurlp/{username}/callback` - pay callback
/// - `GET /lnurlw/{username}` - withdraw offer, requires `token`
/// - `GET /lnurlw/{username}/callback` - withdraw callback
pub fn lnurl_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/lnurlp/{username}", get(get_pay_request))
        .route("/.well-known/lnurlp/{username}", get(get_pay_request))
        .route("/lnurlp/{username}/callback", get(get_pay_callback))
        .route("/lnurlw/{username}", get(get_withdraw_request))
        .route("/lnurlw/{username}/callback", get(get_withdraw_callback))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use lnaddr::LnurlConfig;
    use lnaddr::proto::GENERIC_REJECTION_REASON;
    use lnaddr::testing::{MOCK_INVOICE, MockFunding};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const WITHDRAW_TOKEN: &str = "s3cret";

    fn state_with(funding: MockFunding, withdraw_token: Option<&str>) -> AppState {
        let config = LnurlConfig::new("pay.example.com", 1, 2_000_000).unwrap();
        AppState {
            handler: Arc::new(LnurlHandler::new(config, Arc::new(funding))),
            k1_store: Arc::new(K1Store::new(Duration::from_secs(60))),
            fee_reserve_sats: 100,
            withdraw_token: withdraw_token.map(Arc::from),
        }
    }

    fn app_with(funding: MockFunding) -> (axum::Router, Arc<K1Store>) {
        let state = state_with(funding, Some(WITHDRAW_TOKEN));
        let k1_store = Arc::clone(&state.k1_store);
        (lnurl_router(state), k1_store)
    }

    fn funded() -> MockFunding {
        MockFunding::new("nwc")
            .with_balance(5_000)
            .with_decoded_amount(Some(1500))
    }

    fn app() -> axum::Router {
        app_with(funded()).0
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn assert_rejected(status: StatusCode, body: &Value) {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "ERROR");
        assert_eq!(body["reason"], GENERIC_REJECTION_REASON);
    }

    #[tokio::test]
    async fn test_home_and_health() {
        let (status, body) = get_json(app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Welcome to the Node Remote API");

        let (status, body) = get_json(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_well_known_pay_request() {
        let (status, body) = get_json(app(), "/.well-known/lnurlp/nwc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tag"], "payRequest");
        assert_eq!(body["callback"], "https://pay.example.com/lnurlp/nwc/callback");
        assert_eq!(body["minSendable"], 1000);
        assert_eq!(body["maxSendable"], 2_000_000_000_u64);
        assert_eq!(
            body["metadata"],
            r#"[["text/plain", "Zap nwc some sats"], ["text/identifier", "nwc@pay.example.com"]]"#
        );
    }

    #[tokio::test]
    async fn test_pay_request_overrides() {
        let (status, body) = get_json(app(), "/lnurlp/nwc?amount=21&description=Coffee").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["minSendable"], 21_000);
        assert_eq!(
            body["metadata"],
            r#"[["text/plain", "Coffee"], ["text/identifier", "nwc@pay.example.com"]]"#
        );
    }

    #[tokio::test]
    async fn test_pay_request_encoded() {
        let (status, body) = get_json(app(), "/lnurlp/nwc?amount=21&encode=1").await;
        assert_eq!(status, StatusCode::OK);
        let ln = body["ln"].as_str().unwrap();
        assert_eq!(
            lnaddr::lnurl::decode(ln).unwrap(),
            "https://pay.example.com/lnurlp/nwc?amount=21"
        );
    }

    #[tokio::test]
    async fn test_pay_request_rejections() {
        for uri in [
            "/lnurlp/alice",
            "/lnurlp/nwc?amount=abc",
            "/lnurlp/nwc?amount=3000000",
        ] {
            let (status, body) = get_json(app(), uri).await;
            assert_rejected(status, &body);
        }
    }

    #[tokio::test]
    async fn test_pay_callback() {
        let (status, body) = get_json(app(), "/lnurlp/nwc/callback?amount=5000").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pr"], MOCK_INVOICE);
        assert_eq!(body["routes"], serde_json::json!([]));
        assert_eq!(body["successAction"]["tag"], "message");
        assert_eq!(
            body["successAction"]["message"],
            "Payment to ln address for nwc"
        );
    }

    #[tokio::test]
    async fn test_pay_callback_rejections() {
        for uri in [
            "/lnurlp/nwc/callback",
            "/lnurlp/nwc/callback?amount=",
            "/lnurlp/nwc/callback?amount=-5",
            "/lnurlp/nwc/callback?amount=0",
            "/lnurlp/nwc/callback?amount=2000001000",
            "/lnurlp/bob/callback?amount=5000",
        ] {
            let (status, body) = get_json(app(), uri).await;
            assert_rejected(status, &body);
        }
    }

    #[tokio::test]
    async fn test_backend_outage_is_bad_gateway() {
        let (app, _) = app_with(MockFunding::new("nwc").unavailable());
        let (status, body) = get_json(app, "/lnurlp/nwc/callback?amount=5000").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "ERROR");
    }

    #[tokio::test]
    async fn test_withdraw_flow() {
        let (app, k1_store) = app_with(funded());

        let (status, offer) = get_json(app.clone(), "/lnurlw/nwc?token=s3cret").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(offer["tag"], "withdrawRequest");
        assert_eq!(offer["callback"], "https://pay.example.com/lnurlw/nwc/callback");
        assert_eq!(offer["maxWithdrawable"], 5_000_000);
        let k1 = offer["k1"].as_str().unwrap().to_owned();
        assert_eq!(k1_store.len(), 1);

        let uri = format!("/lnurlw/nwc/callback?k1={k1}&pr={MOCK_INVOICE}");
        let (status, body) = get_json(app.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "status": "OK" }));

        // k1 is single use.
        let (status, body) = get_json(app, &uri).await;
        assert_rejected(status, &body);
    }

    #[tokio::test]
    async fn test_withdraw_callback_rejections() {
        let (app, k1_store) = app_with(MockFunding::new("nwc").with_decoded_amount(Some(1500)));
        k1_store.issue("issued-to-nwc", "nwc");

        for uri in [
            "/lnurlw/nwc/callback".to_owned(),
            format!("/lnurlw/nwc/callback?k1=unknown&pr={MOCK_INVOICE}"),
            "/lnurlw/nwc/callback?k1=issued-to-nwc".to_owned(),
            format!("/lnurlw/bob/callback?k1=issued-to-nwc&pr={MOCK_INVOICE}"),
        ] {
            let (status, body) = get_json(app.clone(), &uri).await;
            assert_rejected(status, &body);
        }
    }

    #[tokio::test]
    async fn test_withdraw_unknown_user() {
        let (status, body) = get_json(app(), "/lnurlw/bob?token=s3cret").await;
        assert_rejected(status, &body);
    }

    #[tokio::test]
    async fn test_withdraw_offer_requires_token() {
        let funding = MockFunding::new("nwc")
            .with_balance(5_000)
            .with_decoded_amount(Some(4_900_000));
        let (app, k1_store) = app_with(funding);

        for uri in ["/lnurlw/nwc", "/lnurlw/nwc?token=", "/lnurlw/nwc?token=s3creT"] {
            let (status, body) = get_json(app.clone(), uri).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["status"], "ERROR");
            assert_eq!(body["reason"], GENERIC_REJECTION_REASON);
        }
        assert!(k1_store.is_empty());
    }

    #[tokio::test]
    async fn test_withdrawals_disabled_without_token() {
        let app = lnurl_router(state_with(funded(), None));

        let (status, _) = get_json(app.clone(), "/lnurlw/nwc").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = get_json(app.clone(), "/lnurlw/nwc?token=s3cret").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let uri = format!("/lnurlw/nwc/callback?k1={}&pr={MOCK_INVOICE}", "00".repeat(32));
        let (status, body) = get_json(app, &uri).await;
        assert_rejected(status, &body);
    }

    #[test]
    fn test_token_matches() {
        assert!(token_matches(WITHDRAW_TOKEN, "s3cret"));
        assert!(!token_matches(WITHDRAW_TOKEN, "s3cre"));
        assert!(!token_matches(WITHDRAW_TOKEN, "s3creT"));
        assert!(!token_matches(WITHDRAW_TOKEN, ""));
    }

    #[tokio::test]
    async fn test_long_encoded_pay_link() {
        let description = "a".repeat(700);
        let uri = format!("/lnurlp/nwc?encode=1&description={description}");
        let (status, body) = get_json(app(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        let decoded = lnaddr::lnurl::decode(body["ln"].as_str().unwrap()).unwrap();
        assert!(decoded.ends_with(&description));
    }
}
