mod common;

use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde_json::json;

use common::app::{spawn_test_app, spawn_with_limits};
use common::fixtures::{frame, OPEN};
use common::http::{assert_json_error, next_sse_chunk, request, response_json};
use eye_gesture_backend::config::LimitsConfig;

async fn create_session(app: &axum::Router) -> String {
    let resp = request(app, Method::POST, "/api/sessions", Some(json!({})), &[]).await;
    let (_, _, body) = response_json(resp).await;
    body["data"]["id"].as_str().expect("session id").to_string()
}

async fn open_stream(app: &axum::Router, id: &str) -> Response {
    request(app, Method::GET, &format!("/api/sessions/{id}/events"), None, &[]).await
}

#[tokio::test]
async fn it_sse_stream_starts_with_connected_snapshot() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;

    let response = open_stream(&app.app, &id).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/event-stream"));

    let mut body = response.into_body();
    let first = next_sse_chunk(&mut body).await.expect("connected event");
    assert!(first.contains("event: connected"), "{first}");
    assert!(first.contains(&id));
    assert_eq!(app.state.active_sse_connections(), 1);
}

#[tokio::test]
async fn it_sse_forwards_detector_events() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;

    let mut body = open_stream(&app.app, &id).await.into_body();
    next_sse_chunk(&mut body).await.expect("connected event");

    request(
        &app.app,
        Method::POST,
        &format!("/api/sessions/{id}/frames"),
        Some(frame(OPEN)),
        &[],
    )
    .await;

    let chunk = next_sse_chunk(&mut body).await.expect("detector event");
    assert!(chunk.contains("event: calibration_progress"), "{chunk}");
    assert!(chunk.contains("\"type\":\"calibration_progress\""), "{chunk}");
}

#[tokio::test]
async fn it_sse_ends_when_session_deleted() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;

    let mut body = open_stream(&app.app, &id).await.into_body();
    next_sse_chunk(&mut body).await.expect("connected event");

    let resp = request(&app.app, Method::DELETE, &format!("/api/sessions/{id}"), None, &[]).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(next_sse_chunk(&mut body).await.is_none());
    drop(body);
    assert_eq!(app.state.active_sse_connections(), 0);
}

#[tokio::test]
async fn it_sse_ends_on_shutdown() {
    let app = spawn_test_app();
    let id = create_session(&app.app).await;

    let mut body = open_stream(&app.app, &id).await.into_body();
    next_sse_chunk(&mut body).await.expect("connected event");

    app.shutdown_tx.send(()).unwrap();
    assert!(next_sse_chunk(&mut body).await.is_none());
}

#[tokio::test]
async fn it_sse_unknown_session_is_404() {
    let app = spawn_test_app();

    let resp = open_stream(&app.app, "missing").await;
    let (status, _, body) = response_json(resp).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "SESSION_NOT_FOUND");
    assert_eq!(app.state.active_sse_connections(), 0);
}

#[tokio::test]
async fn it_sse_connection_cap_is_enforced_and_released() {
    let app = spawn_with_limits(LimitsConfig {
        max_sse_connections: 1,
        ..LimitsConfig::default()
    });
    let id = create_session(&app.app).await;

    let first = open_stream(&app.app, &id).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = open_stream(&app.app, &id).await;
    let (status, _, body) = response_json(second).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_json_error(&body, "RATE_LIMITED");

    drop(first);
    assert_eq!(app.state.active_sse_connections(), 0);
    let third = open_stream(&app.app, &id).await;
    assert_eq!(third.status(), StatusCode::OK);
}
