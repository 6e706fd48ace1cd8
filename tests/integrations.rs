//! Backend and swap clients against local fixture servers

use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use cookie_voice::Error;
use cookie_voice::integrations::{BackendClient, SwapClient, SwapRequest};

mod common;

use common::{UNREACHABLE, spawn_fixture};

async fn backend_fixture() -> String {
    let router = Router::new()
        .route("/api", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/api/agents/{username}",
            get(|headers: HeaderMap, Path(username): Path<String>| async move {
                if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"success": false, "error": "missing api key"})),
                    );
                }
                match username.as_str() {
                    "alice" => (
                        StatusCode::OK,
                        Json(json!({"ok": {"agentName": "Alice", "mindshare": 7.5, "liquidity": null}})),
                    ),
                    "busy" => (
                        StatusCode::TOO_MANY_REQUESTS,
                        Json(json!({"success": false, "error": "slow down"})),
                    ),
                    _ => (
                        StatusCode::NOT_FOUND,
                        Json(json!({"success": false, "error": {"errorMessage": "unknown agent"}})),
                    ),
                }
            }),
        )
        .route(
            "/api/agents/contractAddress/{address}",
            get(|Path(address): Path<String>| async move {
                Json(json!({"ok": {"agentName": format!("token {address}")}}))
            }),
        );

    format!("{}/api", spawn_fixture(router).await)
}

#[tokio::test]
async fn test_health_accepts_any_response() {
    let api = backend_fixture().await;
    let client = BackendClient::new(api, None);

    // The health route answers 404; the server is still alive
    client.health(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_health_unreachable_is_connectivity() {
    let client = BackendClient::new(format!("{UNREACHABLE}/api"), None);
    let err = client.health(Duration::from_secs(2)).await.unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)), "{err:?}");
}

#[tokio::test]
async fn test_agent_sends_api_key() {
    let api = backend_fixture().await;

    let client = BackendClient::new(api.clone(), Some("secret".to_string()));
    let agent = client.agent("alice").await.unwrap();
    assert_eq!(agent.agent_name, "Alice");
    assert!((agent.metrics.mindshare - 7.5).abs() < f64::EPSILON);
    assert!(agent.metrics.liquidity.abs() < f64::EPSILON);

    let anonymous = BackendClient::new(api, None);
    let err = anonymous.agent("alice").await.unwrap_err();
    assert!(err.to_string().contains("missing api key"), "{err}");
}

#[tokio::test]
async fn test_agent_errors_are_described() {
    let api = backend_fixture().await;
    let client = BackendClient::new(api, Some("secret".to_string()));

    let err = client.agent("nobody").await.unwrap_err();
    assert!(matches!(&err, Error::Backend(msg) if msg.contains("unknown agent")), "{err:?}");

    let err = client.agent("busy").await.unwrap_err();
    assert!(matches!(&err, Error::Backend(msg) if msg.contains("rate limit")), "{err:?}");
}

#[tokio::test]
async fn test_agent_by_contract_path() {
    let api = backend_fixture().await;
    let client = BackendClient::new(format!("{api}/"), None);

    let agent = client.agent_by_contract("0xabc").await.unwrap();
    assert_eq!(agent.agent_name, "token 0xabc");
}

#[tokio::test]
async fn test_missing_ok_field_is_backend_error() {
    let router = Router::new().route(
        "/api/agents/{username}",
        get(|| async { Json(json!({"error": "no data"})) }),
    );
    let api = format!("{}/api", spawn_fixture(router).await);
    let client = BackendClient::new(api, None);

    let err = client.agent("alice").await.unwrap_err();
    assert!(matches!(&err, Error::Backend(msg) if msg == "no data"), "{err:?}");
}

#[tokio::test]
async fn test_swap_round_trip() {
    let router = Router::new().route(
        "/swap",
        post(|Json(body): Json<serde_json::Value>| async move {
            if body["amountSei"] == json!(2.0) {
                (StatusCode::OK, Json(json!({"txHash": "0xbeef"})))
            } else {
                (StatusCode::BAD_REQUEST, Json(json!({"error": "bad amount"})))
            }
        }),
    );
    let client = SwapClient::new(spawn_fixture(router).await);

    let receipt = client
        .swap(&SwapRequest {
            dex_screener_url: "https://dexscreener.com/sei/abc".to_string(),
            amount_sei: 2.0,
        })
        .await
        .unwrap();
    assert_eq!(receipt.tx_hash, "0xbeef");

    let err = client
        .swap(&SwapRequest {
            dex_screener_url: "https://dexscreener.com/sei/abc".to_string(),
            amount_sei: 5.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Swap(msg) if msg == "bad amount"), "{err:?}");
}

#[tokio::test]
async fn test_swap_unreachable_is_connectivity() {
    let client = SwapClient::new(UNREACHABLE);
    let err = client
        .swap(&SwapRequest {
            dex_screener_url: "https://dexscreener.com/sei/abc".to_string(),
            amount_sei: 1.0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connectivity(_)), "{err:?}");
}
