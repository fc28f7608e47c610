//! OAuth回调测试
//!
//! A stub provider stands in for Google so the callback can be driven end to end.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use cookie::Cookie;
use dashboard_auth::auth::config::PasswordConfig;
use dashboard_auth::auth::providers::OAuthProvider;
use dashboard_auth::auth::{AuthError, AuthService, ExternalProfile, MemoryStorage};
use dashboard_auth::{AppConfig, AppServer};
use serde_json::{json, Value};

const FRONTEND: &str = "http://localhost:5173";

/// Accepts the code "good-code" for one fixed profile.
struct StubProvider;

#[async_trait]
impl OAuthProvider for StubProvider {
    fn name(&self) -> &str {
        "Google"
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn authorization_url(&self, state: &str) -> Result<String, AuthError> {
        Ok(format!("https://provider.test/auth?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        if code != "good-code" {
            return Err(AuthError::OAuth("code rejected".to_string()));
        }
        Ok(ExternalProfile {
            external_id: "google-123".to_string(),
            email: "Person@Test.com".to_string(),
            display_name: Some("Person".to_string()),
            picture_url: Some("https://img.test/p.png".to_string()),
        })
    }
}

fn create_test_server() -> TestServer {
    let mut config = AppConfig::default();
    config.auth.sweep_interval_secs = 0;
    config.auth.password = PasswordConfig { log_n: 4, r: 8, p: 1 };

    let service = AuthService::with_provider(
        Arc::new(MemoryStorage::new()),
        Arc::new(StubProvider),
        config.auth.clone(),
    )
    .unwrap();
    let server = AppServer::with_service(Arc::new(service), config);
    TestServer::new(server.create_router()).unwrap()
}

fn location(response: &TestResponse) -> String {
    response.header("location").to_str().unwrap().to_string()
}

async fn callback(server: &TestServer, code: &str, state: &str, cookie_state: Option<&str>) -> TestResponse {
    let mut request = server
        .get("/api/auth/google/callback")
        .add_query_param("code", code)
        .add_query_param("state", state);
    if let Some(value) = cookie_state {
        request = request.add_cookie(Cookie::new("oauth_state", value.to_string()));
    }
    request.await
}

#[tokio::test]
async fn test_google_start_sets_state_cookie() {
    let server = create_test_server();

    let response = server.get("/api/auth/google").await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let state = response.cookie("oauth_state").value().to_string();
    assert_eq!(state.len(), 64);
    assert_eq!(location(&response), format!("https://provider.test/auth?state={}", state));
}

#[tokio::test]
async fn test_callback_signs_in_and_redirects() {
    let server = create_test_server();

    let response = callback(&server, "good-code", "s1", Some("s1")).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), FRONTEND);

    let token = response.cookie("auth_token").value().to_string();
    let me = server.get("/api/auth/me").authorization_bearer(&token).await;
    assert_eq!(me.status_code(), StatusCode::OK);
    assert_eq!(me.json::<Value>()["user"]["email"], "person@test.com");
}

#[tokio::test]
async fn test_callback_rejects_state_mismatch() {
    let server = create_test_server();

    let forged = callback(&server, "good-code", "attacker", Some("s1")).await;
    assert_eq!(location(&forged), format!("{}/login?error=oauth_failed", FRONTEND));
    assert!(forged.maybe_cookie("auth_token").is_none());

    let no_cookie = callback(&server, "good-code", "s1", None).await;
    assert_eq!(location(&no_cookie), format!("{}/login?error=oauth_failed", FRONTEND));
}

#[tokio::test]
async fn test_callback_with_bad_code() {
    let server = create_test_server();
    let response = callback(&server, "bad-code", "s1", Some("s1")).await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("{}/login?error=oauth_failed", FRONTEND));
}

#[tokio::test]
async fn test_linked_account_refuses_password_login() {
    let server = create_test_server();
    let registered = server
        .post("/api/auth/register")
        .json(&json!({ "email": "person@test.com", "password": "secret1" }))
        .await;
    assert_eq!(registered.status_code(), StatusCode::CREATED);
    let local_id = registered.json::<Value>()["user"]["id"].clone();

    let linked = callback(&server, "good-code", "s1", Some("s1")).await;
    let token = linked.cookie("auth_token").value().to_string();
    let me = server.get("/api/auth/me").authorization_bearer(&token).await;
    assert_eq!(me.json::<Value>()["user"]["id"], local_id);

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "person@test.com", "password": "secret1" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        login.json::<Value>()["error"],
        "This account uses Google sign-in. Please use \"Continue with Google\"."
    );
}
