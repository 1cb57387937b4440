//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use channel_redirect::config::{RedirectorConfig, StoreBackend};
use channel_redirect::store::{MemoryStore, RecordStore};
use channel_redirect::HttpServer;

/// Default config with the memory backend.
pub fn memory_config() -> RedirectorConfig {
    let mut config = RedirectorConfig::default();
    config.store.backend = StoreBackend::Memory;
    config.store.retry_base_delay_ms = 1;
    config
}

/// A fully layered router over a fresh in-memory store.
pub fn app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let server = HttpServer::new(memory_config(), Arc::new(store.clone()));
    (server.router(), store)
}

/// A fully layered router over the given store.
pub fn app_with(store: Arc<dyn RecordStore>, config: RedirectorConfig) -> Router {
    HttpServer::new(config, store).router()
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: &Router, uri: &str, body: impl Into<String>) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Register a channel through the API and assert it was created.
pub async fn create(app: &Router, body: Value) -> String {
    let response = post_json(app, "/api/create", &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_text(response).await
}
