//! Server Startup Tests
//!
//! Router assembly, public endpoints, and connection limits on a live listener.

mod common;

use std::net::SocketAddr;

use axum::{body::Body, http::Request};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use common::{spawn_gateway, test_config};
use interpreter_gateway::{routes, state::AppState};

async fn get_json(app: axum::Router, uri: &str) -> (http::StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_status_endpoint_reports_ok() {
    let state = AppState::new(test_config(None, "wss://api.openai.com/v1/realtime"));
    let app = routes::create_app(state);

    let (status, body) = get_json(app, "/api/status").await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["active_sessions"], 0);
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(timestamp.contains('T'));
    assert!(timestamp.ends_with('Z'));
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let state = AppState::new(test_config(None, "wss://api.openai.com/v1/realtime"));
    let app = routes::create_app(state);

    let (status, body) = get_json(app, "/").await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(body["name"], "interpreter-gateway");
    assert_eq!(body["endpoints"]["translator"], "/translator");
    assert_eq!(body["endpoints"]["websocket"], "/ws/translate");
    assert_eq!(body["endpoints"]["status"], "/api/status");
}

#[tokio::test]
async fn test_translator_page_is_html() {
    let state = AppState::new(test_config(None, "wss://api.openai.com/v1/realtime"));
    let app = routes::create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/translator")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), http::StatusCode::OK);
    let content_type = response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("/ws/translate"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let state = AppState::new(test_config(None, "wss://api.openai.com/v1/realtime"));
    let app = routes::create_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let state = AppState::new(test_config(None, "wss://api.openai.com/v1/realtime"));
    let app = routes::create_app(state);

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_per_ip_limit_rejects_extra_upgrade() {
    let mut config = test_config(None, "wss://api.openai.com/v1/realtime");
    config.max_connections_per_ip = 1;
    let state = AppState::new(config);

    // Hold the only slot for 127.0.0.1
    let local: SocketAddr = "127.0.0.1:1".parse().unwrap();
    state.try_acquire_connection(local.ip()).unwrap();

    let addr = spawn_gateway(state.clone()).await;
    let err = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/translate"))
        .await
        .unwrap_err();

    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), http::StatusCode::TOO_MANY_REQUESTS);
        }
        other => panic!("expected HTTP rejection, got {other:?}"),
    }

    // The rejected attempt did not leak a slot
    assert_eq!(state.ws_connection_count(), 1);
    assert_eq!(state.ip_connection_count(&local.ip()), 1);
}

#[test]
fn test_config_address_formatting() {
    let mut config = test_config(None, "wss://api.openai.com/v1/realtime");
    config.port = 3001;
    assert_eq!(config.address(), "127.0.0.1:3001");
    assert!(!config.is_tls_enabled());
}
