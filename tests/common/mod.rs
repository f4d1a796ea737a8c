#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use catalog::{app::build_app, state::AppState};

/// Full router over a fresh memory store.
pub fn build_test_app() -> Router {
    build_app(AppState::fake())
}

/// Same as [`build_test_app`] but with the auth limiter lowered to `auth_max`.
pub fn build_test_app_with_auth_limit(auth_max: u32) -> Router {
    let state = AppState::fake();
    let mut config = (*state.config).clone();
    config.rate_limit.auth_max = auth_max;
    build_app(AppState::from_parts(
        Arc::new(config),
        state.users.clone(),
        state.products.clone(),
    ))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Registers `username` and returns its token.
pub async fn register(app: &Router, username: &str, password: &str) -> String {
    let (status, json) = send(
        app,
        Method::POST,
        "/api/auth/register",
        Some(serde_json::json!({ "username": username, "password": password })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {json}");
    json["token"].as_str().unwrap().to_string()
}
