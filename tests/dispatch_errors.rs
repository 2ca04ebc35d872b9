//! Error handling tests for authenticated requests.
//!
//! The PMS API reports business failures in-band, often with HTTP 200.

use biggo_pms::{get_groups, get_platforms, PmsClient, PmsError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, PmsClient) {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(&mock_server)
        .await;

    let client = PmsClient::builder("id", "secret")
        .api_url(format!("{}/api/v1/pms", mock_server.uri()))
        .auth_url(format!("{}/auth/v1/token", mock_server.uri()))
        .build()
        .unwrap();

    (mock_server, client)
}

#[tokio::test]
async fn test_error_code_on_ok_status_is_api_error() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/group"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": false,
            "error_code": 5,
            "error": "platform not found"
        })))
        .mount(&mock_server)
        .await;

    let err = get_groups(&client, "missing").await.unwrap_err();

    match err {
        PmsError::Api { message, code } => {
            assert_eq!(message, "platform not found");
            assert_eq!(code, Some(5));
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_result_false_without_code_is_api_error() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/platform"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": false,
            "message": "permission denied"
        })))
        .mount(&mock_server)
        .await;

    let err = get_platforms(&client).await.unwrap_err();

    assert!(!err.is_auth());
    assert_eq!(err.code(), None);
    assert!(err.to_string().contains("permission denied"));
}

#[tokio::test]
async fn test_zero_error_code_is_success() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/platform"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "error_code": 0,
            "data": []
        })))
        .mount(&mock_server)
        .await;

    let platforms = get_platforms(&client).await.unwrap();
    assert!(platforms.is_empty());
}

#[tokio::test]
async fn test_http_error_status_is_api_error() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/platform"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let err = get_platforms(&client).await.unwrap_err();

    match err {
        PmsError::Api { message, code } => {
            assert!(message.contains("502"), "unexpected message: {message}");
            assert_eq!(code, None);
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_with_business_body_keeps_code() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/platform"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "result": false,
            "error": {"code": 7, "message": "bad platform filter"}
        })))
        .mount(&mock_server)
        .await;

    let err = get_platforms(&client).await.unwrap_err();

    assert_eq!(err.code(), Some(7));
    assert!(err.to_string().contains("bad platform filter"));
}

#[tokio::test]
async fn test_unexpected_shape_is_api_error() {
    let (mock_server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/pms/platform"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": true,
            "data": "not a list"
        })))
        .mount(&mock_server)
        .await;

    let err = get_platforms(&client).await.unwrap_err();
    assert!(matches!(err, PmsError::Api { .. }));
}
