mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use beacon::{
    domain::{NewAnnouncement, Role},
    repository::AnnouncementRepository,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router, identifier: &str, password: &str) -> anyhow::Result<Value> {
    let (status, body) = send(
        app,
        post_json("/api/login/", json!({ "username": identifier, "password": password }), None),
    ).await?;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    Ok(body)
}

#[tokio::test]
async fn test_login_returns_token_pair() -> anyhow::Result<()> {
    let t = common::test_app().await?;
    common::create_account(&t.pool, "alice", "s3cret-pass", Role::Regular).await?;

    let body = login(&t.app, "alice@example.com", "s3cret-pass").await?;
    assert!(body["token"].as_str().is_some());
    assert!(body["refresh"].as_str().is_some());
    assert_eq!(body["must_change_password"], json!(true));

    Ok(())
}

#[tokio::test]
async fn test_bad_login_is_generic_401() -> anyhow::Result<()> {
    let t = common::test_app().await?;
    common::create_account(&t.pool, "alice", "s3cret-pass", Role::Regular).await?;

    for identifier in ["alice", "nobody"] {
        let (status, body) = send(
            &t.app,
            post_json("/api/login/", json!({ "username": identifier, "password": "wrong" }), None),
        ).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No active account found with the given credentials");
    }

    let (status, _) = send(&t.app, post_json("/api/login/", json!({ "username": "alice" }), None)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_refresh_endpoint() -> anyhow::Result<()> {
    let t = common::test_app().await?;
    common::create_account(&t.pool, "alice", "s3cret-pass", Role::Regular).await?;
    let tokens = login(&t.app, "alice", "s3cret-pass").await?;

    let (status, body) = send(
        &t.app,
        post_json("/api/token/refresh/", json!({ "refresh": tokens["refresh"] }), None),
    ).await?;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap().to_string();

    let (status, body) = send(&t.app, get("/api/users/me/", Some(&access))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (status, _) = send(
        &t.app,
        post_json("/api/token/refresh/", json!({ "refresh": tokens["token"] }), None),
    ).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_me_requires_token() -> anyhow::Result<()> {
    let t = common::test_app().await?;

    let (status, _) = send(&t.app, get("/api/users/me/", None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&t.app, get("/api/users/me/", Some("not-a-jwt"))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_staff_only_routes() -> anyhow::Result<()> {
    let t = common::test_app().await?;
    common::create_account(&t.pool, "alice", "s3cret-pass", Role::Regular).await?;
    common::create_account(&t.pool, "boss", "boss-pass", Role::Admin).await?;

    let regular = login(&t.app, "alice", "s3cret-pass").await?;
    let regular_token = regular["token"].as_str().unwrap();
    let (status, _) = send(&t.app, get("/api/users/list/", Some(regular_token))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = login(&t.app, "boss", "boss-pass").await?;
    let admin_token = admin["token"].as_str().unwrap();

    let (status, body) = send(&t.app, get("/api/users/list/", Some(admin_token))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/users/create/",
            json!({ "username": "carol", "email": "carol@example.com", "password": "pw", "is_staff": true }),
            Some(admin_token),
        ),
    ).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["is_staff"], json!(true));
    assert_eq!(body["role"], "admin");

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/users/create/",
            json!({ "username": "carol", "email": "other@example.com", "password": "pw" }),
            Some(admin_token),
        ),
    ).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already exists!");

    let (status, _) = send(
        &t.app,
        post_json(
            "/api/users/create/",
            json!({ "username": "dave", "email": "not-an-email", "password": "pw" }),
            Some(admin_token),
        ),
    ).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_change_password_endpoint() -> anyhow::Result<()> {
    let t = common::test_app().await?;
    common::create_account(&t.pool, "alice", "s3cret-pass", Role::Regular).await?;
    let tokens = login(&t.app, "alice", "s3cret-pass").await?;
    let token = tokens["token"].as_str().unwrap();

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/users/change-password/",
            json!({ "current_password": "s3cret-pass", "new_password": "123" }),
            Some(token),
        ),
    ).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["new_password"].as_array().is_some_and(|p| p.len() >= 2));

    let (status, body) = send(
        &t.app,
        post_json(
            "/api/users/change-password/",
            json!({ "current_password": "s3cret-pass", "new_password": "Vivid-Lantern-42" }),
            Some(token),
        ),
    ).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Password updated successfully.");

    let tokens = login(&t.app, "alice", "Vivid-Lantern-42").await?;
    assert_eq!(tokens["must_change_password"], json!(false));

    Ok(())
}

#[tokio::test]
async fn test_active_announcement() -> anyhow::Result<()> {
    let t = common::test_app().await?;

    let (status, body) = send(&t.app, get("/api/announcements/active/", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": null }));

    t.state.service_context.announcement_repo
        .create(NewAnnouncement {
            title: Some("Heads up".to_string()),
            message: "Scheduled maintenance tonight".to_string(),
            link: None,
            active: true,
        })
        .await?;

    let (status, body) = send(&t.app, get("/api/announcements/active/", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Heads up");
    assert_eq!(body["message"], "Scheduled maintenance tonight");
    assert_eq!(body["link"], Value::Null);

    Ok(())
}

#[tokio::test]
async fn test_disallowed_host_rejected() -> anyhow::Result<()> {
    let mut settings = common::test_settings();
    settings.server.allowed_hosts = vec![".example.com".to_string()];
    let t = common::test_app_with(settings).await?;

    let request = Request::builder()
        .uri("/health")
        .header(header::HOST, "evil.test")
        .body(Body::empty())?;
    let response = t.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/health")
        .header(header::HOST, "api.example.com:8000")
        .body(Body::empty())?;
    let response = t.app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_password_shaped_like_a_hash_is_still_hashed() -> anyhow::Result<()> {
    let t = common::test_app().await?;
    common::create_account(&t.pool, "boss", "boss-pass", Role::Admin).await?;
    let admin = login(&t.app, "boss", "boss-pass").await?;
    let admin_token = admin["token"].as_str().unwrap();

    let typed = beacon::auth::AuthService::hash_password("something-else").await?;
    let (status, _) = send(
        &t.app,
        post_json(
            "/api/users/create/",
            json!({ "username": "frank", "email": "frank@example.com", "password": typed }),
            Some(admin_token),
        ),
    ).await?;
    assert_eq!(status, StatusCode::CREATED);

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM accounts WHERE username = 'frank'")
        .fetch_one(&t.pool)
        .await?;
    assert_ne!(stored, typed);

    login(&t.app, "frank", &typed).await?;

    // the string does not double as the password it encodes
    let (status, _) = send(
        &t.app,
        post_json("/api/login/", json!({ "username": "frank", "password": "something-else" }), None),
    ).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
