use std::sync::Arc;

use flashlight_core::{CanonicalUuid, ErrorKind, RequestContext};
use flashlight_upstream::StatsClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn uuid() -> CanonicalUuid {
    CanonicalUuid::parse("1234abcd123456789abc1234567890ab").unwrap()
}

#[tokio::test]
async fn fetches_and_parses_a_populated_player() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/player"))
        .and(query_param("uuid", uuid().to_compact()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "player": {
                "uuid": uuid().to_compact(),
                "displayname": "Steve",
                "stats": {"Bedwars": {"wins_bedwars": 3}}
            }
        })))
        .mount(&server)
        .await;

    let client = StatsClient::new(
        server.uri(),
        "test-key",
        Arc::new(flashlight_upstream::limiters::default_stats_limiter()),
    );
    let ctx = RequestContext::new();

    let pit = client.get_player(&uuid(), &ctx).await.unwrap();
    assert_eq!(pit.uuid, uuid());
    assert_eq!(pit.overall.wins, 3);
}

#[tokio::test]
async fn player_null_surfaces_as_player_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/player"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "player": null
        })))
        .mount(&server)
        .await;

    let client = StatsClient::new(
        server.uri(),
        "test-key",
        Arc::new(flashlight_upstream::limiters::default_stats_limiter()),
    );
    let ctx = RequestContext::new();

    let err = client.get_player(&uuid(), &ctx).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::PlayerNotFound);
}

#[tokio::test]
async fn gateway_error_surfaces_as_temporarily_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/player"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = StatsClient::new(
        server.uri(),
        "test-key",
        Arc::new(flashlight_upstream::limiters::default_stats_limiter()),
    );
    let ctx = RequestContext::new();

    let err = client.get_player(&uuid(), &ctx).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::TemporarilyUnavailable);
}
