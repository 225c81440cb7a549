//! Integration tests for transport retry and abort behavior
//!
//! Request counts are enforced through wiremock expectations, so a missing
//! or extra retry fails the test when the mock server shuts down.

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mindat_downloader::http::{HttpClient, TransportError};

use crate::support;

fn transport(server: &MockServer) -> (HttpClient, String) {
    let config = support::test_config(&server.uri(), 100);
    let http = HttpClient::new(&config.timeouts, config.retries.clone(), "test-key")
        .expect("client builds from test settings");
    (http, format!("{}/localities/", server.uri()))
}

#[tokio::test]
async fn requests_carry_token_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .and(header("authorization", "Token test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    assert!(http.get_json(&url, &[]).await.is_ok());
}

#[tokio::test]
async fn transient_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    // Two failures, then the healthy mock takes over.
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    let body = http.get_json(&url, &[]).await.unwrap();

    assert_eq!(body[0]["id"], 1);
}

#[tokio::test]
async fn rate_limiting_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    assert!(http.get_json(&url, &[]).await.is_ok());
}

#[tokio::test]
async fn auth_rejection_aborts_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    let err = http.get_json(&url, &[]).await.unwrap_err();

    assert!(matches!(err, TransportError::Auth { status: 401, .. }));
}

#[tokio::test]
async fn not_found_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    let err = http.get_json(&url, &[]).await.unwrap_err();

    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[tokio::test]
async fn exhausted_retry_budget_surfaces_the_last_status() {
    let server = MockServer::start().await;
    // Three total attempts under the test retry policy.
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    let err = http.get_json(&url, &[]).await.unwrap_err();

    assert!(matches!(err, TransportError::Status { status: 503, .. }));
}

#[tokio::test]
async fn non_json_content_type_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>busy</html>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    let err = http.get_json(&url, &[]).await.unwrap_err();

    assert!(matches!(err, TransportError::Decode { .. }));
}

#[tokio::test]
async fn invalid_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/localities/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{truncated", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let (http, url) = transport(&server);

    let err = http.get_json(&url, &[]).await.unwrap_err();

    assert!(matches!(err, TransportError::Decode { .. }));
}
