//! Shared fixtures for the API integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pairwatch_api::{create_router, AppState};
use pairwatch_core::{
    bootstrap::init_services,
    config::{PasswordHashConfig, RoomSeed},
    Config,
};
use serde_json::Value;
use tower::ServiceExt;

pub const SITE_PASSWORD: &str = "letmein";
pub const CDN: &str = "https://cdn.test/";

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.site_password = SITE_PASSWORD.to_string();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.auth.password_hash = PasswordHashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    config.storage.public_url_prefix = Some(CDN.to_string());
    config.storage.max_upload_bytes = 1024;
    config.rooms = vec![RoomSeed {
        name: "demo".to_string(),
        password: "password".to_string(),
        video_key: "sintel.mp4".to_string(),
    }];
    config
}

pub async fn test_state_with(config: &Config) -> AppState {
    let services = init_services(config).await.unwrap();
    AppState::new(services, config)
}

pub async fn test_state() -> AppState {
    test_state_with(&test_config()).await
}

pub fn router(state: &AppState) -> Router {
    create_router(state.clone(), None)
}

/// Send one request through a fresh router and decode the JSON reply
pub async fn call(
    state: &AppState,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    send(state, request).await
}

pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub async fn site_token(state: &AppState) -> String {
    let (status, body) = call(
        state,
        Method::POST,
        "/api/site-auth",
        None,
        Some(serde_json::json!({ "password": SITE_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().unwrap().to_string()
}

/// Log into a room; returns (room id, room token)
pub async fn room_token(state: &AppState, site: &str, name: &str, password: &str) -> (u64, String) {
    let (status, body) = call(
        state,
        Method::POST,
        "/api/room-auth",
        Some(site),
        Some(serde_json::json!({ "name": name, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    (
        body["room"]["id"].as_u64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}
