use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use flashlight_core::TracingReporter;
use flashlight_http::{build_router, AppState};
use flashlight_ratelimit::TokenBucket;
use flashlight_repository::InMemoryPlayerRepository;
use flashlight_upstream::{limiters, AccountClient, StatsClient};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PEER: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::new(203, 0, 113, 9)), 1234);

async fn test_state(hypixel: &MockServer, mojang: &MockServer) -> AppState {
    let stats_client = StatsClient::new(hypixel.uri(), "test-key", Arc::new(limiters::default_stats_limiter()));
    let account_client = AccountClient::new(mojang.uri(), limiters::default_account_limiter());
    let repository = Arc::new(InMemoryPlayerRepository::new());
    let reporter = Arc::new(TracingReporter);
    let ip_limiter = Arc::new(TokenBucket::new("ip-test", 1000.0, 1000.0, Duration::from_secs(60)));
    let user_limiter = Arc::new(TokenBucket::new("user-test", 1000.0, 1000.0, Duration::from_secs(60)));
    AppState::new(stats_client, account_client, repository, reporter, ip_limiter, user_limiter)
}

fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = builder.header("content-type", "application/json");
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };
    let mut req = builder.body(body).unwrap();
    req.extensions_mut().insert(ConnectInfo(PEER));
    req
}

#[tokio::test]
async fn playerdata_returns_populated_player() {
    let hypixel = MockServer::start().await;
    let mojang = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "player": {
                "uuid": "1234abcd123456789abc1234567890ab",
                "displayname": "Steve",
                "stats": {"Bedwars": {"wins_bedwars": 3, "Experience": 500.0}}
            }
        })))
        .mount(&hypixel)
        .await;

    let state = test_state(&hypixel, &mojang).await;
    let router = build_router(state, vec![]);

    let response = router
        .oneshot(request(
            "GET",
            "/v1/playerdata?uuid=1234abcd123456789abc1234567890ab",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    // The body mirrors upstream's own shape verbatim, not flashlight's
    // reshaped domain type.
    assert_eq!(json["success"], json!(true));
    assert_eq!(json["player"]["displayname"], json!("Steve"));
    assert_eq!(json["player"]["stats"]["Bedwars"]["wins_bedwars"], json!(3));
}

#[tokio::test]
async fn playerdata_rejects_malformed_uuid() {
    let hypixel = MockServer::start().await;
    let mojang = MockServer::start().await;
    let state = test_state(&hypixel, &mojang).await;
    let router = build_router(state, vec![]);

    let response = router
        .oneshot(request("GET", "/v1/playerdata?uuid=not-a-uuid", None))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn playerdata_null_player_is_success_shaped_404() {
    let hypixel = MockServer::start().await;
    let mojang = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "player": null
        })))
        .mount(&hypixel)
        .await;

    let state = test_state(&hypixel, &mojang).await;
    let router = build_router(state, vec![]);

    let response = router
        .oneshot(request(
            "GET",
            "/v1/playerdata?uuid=1234abcd123456789abc1234567890ab",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!({"success": true, "player": null}));
}

#[tokio::test]
async fn ip_rate_limit_gate_returns_429_once_exhausted() {
    let hypixel = MockServer::start().await;
    let mojang = MockServer::start().await;
    let stats_client = StatsClient::new(hypixel.uri(), "test-key", Arc::new(limiters::default_stats_limiter()));
    let account_client = AccountClient::new(mojang.uri(), limiters::default_account_limiter());
    let repository = Arc::new(InMemoryPlayerRepository::new());
    let reporter = Arc::new(TracingReporter);
    let ip_limiter = Arc::new(TokenBucket::new("ip-test", 0.0, 1.0, Duration::from_secs(60)));
    let user_limiter = Arc::new(TokenBucket::new("user-test", 1000.0, 1000.0, Duration::from_secs(60)));
    let state = AppState::new(stats_client, account_client, repository, reporter, ip_limiter, user_limiter);
    let router = build_router(state, vec![]);

    let first = router
        .clone()
        .oneshot(request("GET", "/v1/account/username/steve", None))
        .await
        .unwrap();
    assert_eq!(first.status(), 404);

    let second = router
        .oneshot(request("GET", "/v1/account/username/steve", None))
        .await
        .unwrap();
    assert_eq!(second.status(), 429);
}

#[tokio::test]
async fn account_by_username_not_found_surfaces_as_404() {
    let hypixel = MockServer::start().await;
    let mojang = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/profiles/minecraft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mojang)
        .await;

    let state = test_state(&hypixel, &mojang).await;
    let router = build_router(state, vec![]);

    let response = router
        .oneshot(request("GET", "/v1/account/username/nosuchuser", None))
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn history_rejects_malformed_uuid_in_body() {
    let hypixel = MockServer::start().await;
    let mojang = MockServer::start().await;
    let state = test_state(&hypixel, &mojang).await;
    let router = build_router(state, vec![]);

    let response = router
        .oneshot(request(
            "POST",
            "/v1/history",
            Some(json!({
                "uuid": "not-a-uuid",
                "start": "2023-01-01T00:00:00Z",
                "end": "2023-01-02T00:00:00Z",
                "limit": 10
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}
