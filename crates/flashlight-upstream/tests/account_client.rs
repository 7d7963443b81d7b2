use flashlight_core::{CanonicalUuid, ErrorKind, RequestContext};
use flashlight_upstream::{limiters, AccountClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_by_uuid_parses_a_profile() {
    let server = MockServer::start().await;
    let uuid = "1234abcd123456789abc1234567890ab";
    Mock::given(method("GET"))
        .and(path(format!("/session/minecraft/profile/{uuid}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": uuid, "name": "Steve"})),
        )
        .mount(&server)
        .await;

    let client = AccountClient::new(server.uri(), limiters::default_account_limiter());
    let ctx = RequestContext::new();

    let account = client
        .get_by_uuid(&CanonicalUuid::parse(uuid).unwrap(), &ctx)
        .await
        .unwrap();
    assert_eq!(account.username, "Steve");
}

#[tokio::test]
async fn get_by_uuid_missing_profile_is_username_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = AccountClient::new(server.uri(), limiters::default_account_limiter());
    let ctx = RequestContext::new();
    let uuid = CanonicalUuid::parse("1234abcd123456789abc1234567890ab").unwrap();

    let err = client.get_by_uuid(&uuid, &ctx).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UsernameNotFound);
}

#[tokio::test]
async fn concurrent_username_lookups_coalesce_into_one_bulk_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/profiles/minecraft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": "1234abcd123456789abc1234567890ab", "name": "Steve"},
            {"id": "aaaaaaaabbbbccccddddeeeeffff0000", "name": "Alex"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = AccountClient::new(server.uri(), limiters::default_account_limiter());

    let (a, b) = tokio::join!(
        client.get_by_username("Steve"),
        client.get_by_username("Alex"),
    );

    assert_eq!(a.unwrap().username, "Steve");
    assert_eq!(b.unwrap().username, "Alex");
}

#[tokio::test]
async fn username_missing_from_bulk_response_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/profiles/minecraft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = AccountClient::new(server.uri(), limiters::default_account_limiter());

    let err = client.get_by_username("Ghost").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UsernameNotFound);
}

#[tokio::test]
async fn bulk_failure_falls_back_to_individual_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/profiles/minecraft"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/profiles/minecraft/Steve"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "1234abcd123456789abc1234567890ab",
            "name": "Steve"
        })))
        .mount(&server)
        .await;

    let client = AccountClient::new(server.uri(), limiters::default_account_limiter());

    let account = client.get_by_username("Steve").await.unwrap();
    assert_eq!(account.username, "Steve");
}
