//! E2E tests for admin authentication

mod common;

use common::{TEST_ADMIN_EMAIL, TEST_ADMIN_PASSWORD, TestServer};

#[tokio::test]
async fn login_with_valid_credentials_sets_session_cookie() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&serde_json::json!({
            "email": TEST_ADMIN_EMAIL,
            "password": TEST_ADMIN_PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("login should set a cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["email"], TEST_ADMIN_EMAIL);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&serde_json::json!({
            "email": TEST_ADMIN_EMAIL,
            "password": "wrong-password",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn login_with_unknown_email_is_rejected() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/auth/login"))
        .json(&serde_json::json!({
            "email": "intruder@test.example.com",
            "password": TEST_ADMIN_PASSWORD,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/v1/complaints"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .get(server.url("/api/v1/streaming/complaints"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn bearer_token_grants_access_to_admin_routes() {
    let server = TestServer::new().await;
    let token = server.create_admin_token();

    let response = server
        .client
        .get(server.url("/api/v1/complaints"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let server = TestServer::new().await;
    let mut token = server.create_admin_token();
    token.push('x');

    let response = server
        .client
        .get(server.url("/api/v1/complaints"))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let server = TestServer::new().await;

    // The overwrite must be set even when the request carries no cookie.
    let response = server
        .client
        .post(server.url("/auth/logout"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("logout should clear the cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn logout_invalidates_an_active_session() {
    let server = TestServer::new().await;
    let token = server.create_admin_token();

    let response = server
        .client
        .post(server.url("/auth/logout"))
        .header("Cookie", format!("session={}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .expect("logout should clear the cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("session="));

    // The emptied cookie no longer opens admin routes.
    let response = server
        .client
        .get(server.url("/api/v1/complaints"))
        .header("Cookie", "session=")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}
