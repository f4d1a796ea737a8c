//! HTTP-level tests for registration, login and the access guard.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{body_json, build_test_app, build_test_app_with_auth_limit, register, send};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use time::OffsetDateTime;
use tower::ServiceExt;
use uuid::Uuid;

fn token_for(user_id: Uuid, exp_offset_secs: i64) -> String {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let claims = json!({
        "sub": user_id,
        "iat": now,
        "exp": now + exp_offset_secs,
        "iss": "test-issuer",
        "aud": "test-aud",
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

#[tokio::test]
async fn register_returns_201_with_id_username_token() {
    let app = build_test_app();
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(json!({ "username": "  alice  ", "password": "secret1" })),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["username"], "alice");
    assert!(json["_id"].is_string());
    assert!(json["token"].is_string());
    assert!(json.get("password").is_none());
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_400() {
    let app = build_test_app();
    register(&app, "bob", "password1").await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(json!({ "username": "bob", "password": "different" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Username already exists");
}

#[tokio::test]
async fn register_reports_missing_and_short_fields() {
    let app = build_test_app();

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(json!({ "username": "carol" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Username and password are required");

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(json!({ "username": "ca", "password": "123" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"],
        "Username must be at least 3 characters, Password must be at least 6 characters"
    );
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = build_test_app();
    register(&app, "dave", "rightpass").await;

    let wrong_pass = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "username": "dave", "password": "wrongpass" })),
        None,
    )
    .await;
    let no_user = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "username": "nobody", "password": "rightpass" })),
        None,
    )
    .await;

    assert_eq!(wrong_pass.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pass, no_user);
    assert_eq!(wrong_pass.1["error"], "Invalid credentials");
}

#[tokio::test]
async fn login_returns_fresh_token_for_same_user() {
    let app = build_test_app();
    let (_, reg) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        Some(json!({ "username": "erin", "password": "secret1" })),
        None,
    )
    .await;

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({ "username": "erin", "password": "secret1" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["_id"], reg["_id"]);

    // The new token opens protected routes.
    let token = json["token"].as_str().unwrap();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "name": "Widget", "price": 1 })),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn guard_rejects_missing_and_bad_tokens() {
    let app = build_test_app();
    let body = Some(json!({ "name": "Widget", "price": 1 }));

    let (status, json) = send(&app, Method::POST, "/api/products", body.clone(), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Not authorized, no token");

    let (status, json) = send(
        &app,
        Method::POST,
        "/api/products",
        body.clone(),
        Some("garbage"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Not authorized, token failed");

    let expired = token_for(Uuid::new_v4(), -120);
    let (status, json) = send(&app, Method::POST, "/api/products", body, Some(&expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Not authorized, token failed");

    // Nothing was written by any of the rejected requests.
    let (_, list) = send(&app, Method::GET, "/api/products", None, None).await;
    assert_eq!(list, json!([]));

    let owner = register(&app, "gwen", "secret1").await;
    let (_, created) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "name": "Kept", "price": 4 })),
        Some(&owner),
    )
    .await;
    let path = format!("/api/products/{}", created["_id"].as_str().unwrap());

    let (status, json) = send(&app, Method::DELETE, &path, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Not authorized, no token");

    let (status, fetched) = send(&app, Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Kept");
}

#[tokio::test]
async fn guard_rejects_before_reading_the_body() {
    let app = build_test_app();
    let (status, json) = send(
        &app,
        Method::PUT,
        &format!("/api/products/{}", Uuid::new_v4()),
        Some(json!({ "price": "not a number" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Not authorized, no token");
}

#[tokio::test]
async fn valid_token_for_vanished_user_still_passes() {
    let app = build_test_app();
    let token = token_for(Uuid::new_v4(), 3600);
    let (status, json) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "name": "Orphan", "price": 3 })),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["name"], "Orphan");
}

#[tokio::test]
async fn auth_routes_are_rate_limited() {
    let app = build_test_app_with_auth_limit(2);
    let body = Some(json!({ "username": "frank", "password": "x" }));

    for _ in 0..2 {
        let (status, _) = send(&app, Method::POST, "/api/auth/login", body.clone(), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.unwrap().to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    // The stricter auth limiter's headers win over the general one.
    assert_eq!(response.headers()["ratelimit-limit"], "2");
    assert_eq!(response.headers()["ratelimit-remaining"], "0");
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Too many authentication attempts, please try again after 15 minutes."
    );

    // Product routes only count against the general limiter.
    let (status, _) = send(&app, Method::GET, "/api/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
