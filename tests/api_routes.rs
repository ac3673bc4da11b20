use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use battle_timer::{
    api::create_router, state::AppState, tasks::timer_event_task, TimerCallbacks, TimerOptions,
};

fn app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        20554,
        "127.0.0.1".to_string(),
        TimerOptions::default(),
        TimerCallbacks::new(),
    ));
    (create_router(Arc::clone(&state)), state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn status_before_first_sync_is_unsynced() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["remaining_seconds"], Value::Null);
    assert_eq!(body["timer"]["formatted"], "0:00");
    assert_eq!(body["timer"]["phase"], "unsynced");
    assert_eq!(body["port"], 20554);
}

#[tokio::test]
async fn sync_then_start_reports_counting() {
    let (app, _) = app();

    let (status, body) = send(&app, Method::POST, "/sync", Some(json!({ "time_remaining": 90 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paused");
    assert_eq!(body["timer"]["formatted"], "1:30");
    assert_eq!(body["timer"]["progress"], 50.0);

    let (status, body) = send(&app, Method::POST, "/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "counting");

    let (_, body) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(body["last_action"], "start");
    assert_eq!(body["timer"]["is_active"], true);

    let (_, body) = send(&app, Method::POST, "/pause", None).await;
    assert_eq!(body["status"], "paused");
}

#[tokio::test]
async fn reset_key_forces_resync_over_http() {
    let (app, _) = app();

    send(&app, Method::POST, "/sync", Some(json!({ "time_remaining": 60, "reset_key": "r1" }))).await;
    let (_, body) = send(&app, Method::POST, "/sync", Some(json!({ "time_remaining": 60 }))).await;
    assert_eq!(body["message"], "Authoritative value applied");

    let (_, body) = send(&app, Method::POST, "/sync", Some(json!({ "time_remaining": 60, "reset_key": "r2" }))).await;
    assert_eq!(body["message"], "Timer reset to authoritative value");
    assert_eq!(body["timer"]["remaining_seconds"], 60);

    let (_, body) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(body["last_action"], "reset");
}

#[tokio::test]
async fn negative_value_degrades_to_expired() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::POST, "/sync", Some(json!({ "time_remaining": -5 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "expired");
    assert_eq!(body["timer"]["formatted"], "0:00");
    assert_eq!(body["timer"]["is_expired"], true);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/sync")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test(start_paused = true)]
async fn status_reports_last_timer_event() {
    let (app, state) = app();
    let event_task = tokio::spawn(timer_event_task(Arc::clone(&state)));
    tokio::task::yield_now().await;

    send(&app, Method::POST, "/sync", Some(json!({ "time_remaining": 1 }))).await;
    send(&app, Method::POST, "/start", None).await;

    tokio::time::sleep(Duration::from_millis(1000)).await;
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    let (_, body) = send(&app, Method::GET, "/status", None).await;
    assert_eq!(body["timer"]["remaining_seconds"], 0);
    assert_eq!(body["last_event"]["type"], "expired");
    assert!(body["last_event_time"].is_string());

    event_task.abort();
}
