mod common;

use chrono::Duration;
use common::token_pair;
use common::TestApp;
use common::FRONTEND_URL;
use reqwest::header;
use reqwest::Method;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Value;

#[tokio::test]
async fn test_root() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Auth API is running");
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let body = app.register("a@x.com", "alice", "pw123").await;

    assert_eq!(body["status_code"], 201);
    assert_eq!(body["data"]["email"], "a@x.com");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["is_active"], true);
    assert!(body["data"]["id"].is_string());
    assert!(body["data"]["created_at"].is_string());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_unprefixed_paths_are_not_served() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;

    for path in ["/register", "/login", "/refresh", "/logout"] {
        let response = app
            .post(path)
            .json(&json!({ "email": "a@x.com", "password": "pw123" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
    }

    let response = app
        .get("/me")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "email": "a@x.com",
            "username": "alice2",
            "password": "pw123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "email": "other@x.com",
            "username": "alice",
            "password": "pw123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "email": "not-an-email",
            "username": "alice",
            "password": "pw123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com", "password": "pw123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["token_type"], "bearer");

    let (access_token, refresh_token) = token_pair(&body);
    assert_ne!(access_token, refresh_token);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Incorrect email or password");
}

#[tokio::test]
async fn test_login_unknown_email_is_indistinguishable() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@x.com", "password": "pw123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Incorrect email or password");
}

#[tokio::test]
async fn test_login_missing_field() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/users/me")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );

    let response = app
        .get_authenticated("/api/users/me", "not.a.token")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Could not validate credentials");
}

#[tokio::test]
async fn test_me_rejects_refresh_token() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;
    let (_, refresh_token) = app.login("a@x.com", "pw123").await;

    let response = app
        .get_authenticated("/api/users/me", &refresh_token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_expires() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;
    let (access_token, _) = app.login("a@x.com", "pw123").await;

    app.clock.advance(Duration::minutes(30) - Duration::seconds(1));
    let response = app
        .get_authenticated("/api/users/me", &access_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    app.clock.advance(Duration::seconds(1));
    let response = app
        .get_authenticated("/api/users/me", &access_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotation() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;
    let (_, refresh_token) = app.login("a@x.com", "pw123").await;

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    let (new_access_token, new_refresh_token) = token_pair(&body);
    assert_ne!(new_refresh_token, refresh_token);

    // Presenting the spent token again fails.
    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Invalid refresh token");

    let response = app
        .get_authenticated("/api/users/me", &new_access_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;
    let (access_token, _) = app.login("a@x.com", "pw123").await;

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": access_token }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_refresh_single_winner() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;
    let (_, refresh_token) = app.login("a@x.com", "pw123").await;

    let first = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send();
    let second = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send();

    let (first, second) = tokio::join!(first, second);
    let mut statuses = vec![
        first.expect("Failed to execute request").status(),
        second.expect("Failed to execute request").status(),
    ];
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::UNAUTHORIZED]);
}

#[tokio::test]
async fn test_logout_requires_bearer_token() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/logout")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_leaves_other_users_alone() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;
    app.register("b@x.com", "bob", "hunter2").await;
    let (alice_access, alice_refresh) = app.login("a@x.com", "pw123").await;
    let (_, bob_refresh) = app.login("b@x.com", "hunter2").await;

    let response = app
        .post_authenticated("/api/auth/logout", &alice_access)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Successfully logged out");

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": alice_refresh }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": bob_refresh }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    // Second logout with the still-valid access token is a no-op.
    let response = app
        .post_authenticated("/api/auth/logout", &alice_access)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_inactive_user_is_locked_out() {
    let app = TestApp::spawn().await;
    let body = app.register("a@x.com", "alice", "pw123").await;
    let (access_token, refresh_token) = app.login("a@x.com", "pw123").await;

    let user_id = auth_service::domain::user::models::UserId::from_string(
        body["data"]["id"].as_str().unwrap(),
    )
    .unwrap();
    assert!(app.users.set_active(&user_id, false).await);

    let response = app
        .get_authenticated("/api/users/me", &access_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com", "password": "pw123" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend() {
    let app = TestApp::spawn().await;

    let response = app
        .api_client
        .request(Method::OPTIONS, format!("{}/api/auth/login", app.address))
        .header(header::ORIGIN, FRONTEND_URL)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        FRONTEND_URL
    );
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_full_session_scenario() {
    let app = TestApp::spawn().await;
    app.register("a@x.com", "alice", "pw123").await;

    let (access_token, refresh_token) = app.login("a@x.com", "pw123").await;

    let response = app
        .get_authenticated("/api/users/me", &access_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "a@x.com");

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.expect("Failed to parse response");
    let (new_access_token, new_refresh_token) = token_pair(&body);

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_authenticated("/api/auth/logout", &new_access_token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post("/api/auth/refresh")
        .json(&json!({ "refresh_token": new_refresh_token }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Invalid refresh token");
}
