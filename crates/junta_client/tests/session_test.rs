//! Integration tests for login, logout, and session persistence

use std::path::Path;

use junta_client::{ApiRequest, ClientError, Config, JuntaClient, JuntaClientTrait};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        api_base: format!("{}/api", server.uri()),
        request_timeout_secs: 5,
        ..Config::default()
    }
}

fn seed_session(dir: &Path, access: &str, refresh: &str) {
    std::fs::write(
        dir.join("session.json"),
        serde_json::json!({
            "access_token": access,
            "refresh_token": refresh,
            "obtained_at": "2026-08-06T00:00:00Z",
        })
        .to_string(),
    )
    .expect("seed session");
}

#[tokio::test]
async fn login_stores_the_session_and_later_requests_carry_it() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({
            "username": "tesorero",
            "password": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "acc-after-login",
            "refresh_token": "ref-after-login"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/socios"))
        .and(header("authorization", "Bearer acc-after-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let client =
        JuntaClient::new(test_config(&server), dir.path().to_path_buf()).expect("client");
    assert!(!client.has_session());

    let session = client.login("tesorero", "s3cret").await.expect("login");
    assert_eq!(session.access_token, "acc-after-login");
    assert!(client.has_session());
    assert!(dir.path().join("session.json").exists());

    let response = client.send(ApiRequest::get("/socios")).await.expect("send");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn a_cached_session_survives_a_restart() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/medidores"))
        .and(header("authorization", "Bearer acc-disk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    seed_session(dir.path(), "acc-disk", "ref-disk");

    // A freshly constructed client resumes the cached session.
    let client =
        JuntaClient::new(test_config(&server), dir.path().to_path_buf()).expect("client");
    assert!(client.has_session());
    assert_eq!(
        client.session().map(|s| s.refresh_token),
        Some("ref-disk".to_string())
    );

    let response = client
        .send(ApiRequest::get("/medidores"))
        .await
        .expect("send");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn rejected_login_leaves_no_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let client =
        JuntaClient::new(test_config(&server), dir.path().to_path_buf()).expect("client");

    let result = client.login("tesorero", "wrong").await;
    match result {
        Err(err @ ClientError::CredentialRejected { .. }) => assert!(err.is_logged_out()),
        other => panic!("expected CredentialRejected, got {other:?}"),
    }
    assert!(!client.has_session());
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn logout_clears_memory_and_disk() {
    let server = MockServer::start().await;

    let dir = tempfile::tempdir().expect("tempdir");
    seed_session(dir.path(), "acc", "ref");
    let client =
        JuntaClient::new(test_config(&server), dir.path().to_path_buf()).expect("client");
    assert!(client.has_session());

    client.logout().await;

    assert!(!client.has_session());
    assert!(!dir.path().join("session.json").exists());
}
