//! Status API routes, served in-process.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use health_alerter::evaluator::{AlertState, AlertStatus, AlertView, StatusHandle, StatusSnapshot};
use health_alerter::status::status_router;

mod common;

fn seeded() -> StatusHandle {
    let mut status = AlertStatus::new(common::t(0));
    status.state = AlertState::Firing;
    status.active_since = Some(common::t(1));

    let mut snapshot = StatusSnapshot::default();
    snapshot.alerts.insert("ModelUnhealthy".to_string(), AlertView::new(&status, "critical"));
    snapshot.stale = true;
    snapshot.ticks_total = 7;

    let handle = StatusHandle::new();
    handle.publish(snapshot);
    handle
}

async fn get(router: Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let response = router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_status_lists_alerts_and_staleness() {
    let (code, body) = get(status_router(seeded(), None), "/status", None).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["stale"], true);
    assert_eq!(body["ticks_total"], 7);
    assert_eq!(body["alerts"]["ModelUnhealthy"]["state"], "FIRING");
    assert_eq!(body["alerts"]["ModelUnhealthy"]["severity"], "critical");
}

#[tokio::test]
async fn test_single_alert_and_unknown_alert() {
    let router = status_router(seeded(), None);

    let (code, body) = get(router.clone(), "/status/alerts/ModelUnhealthy", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["name"], "ModelUnhealthy");
    assert_eq!(body["state"], "FIRING");
    assert_eq!(body["stale"], true);

    let (code, body) = get(router, "/status/alerts/Nope", None).await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Nope"));
}

#[tokio::test]
async fn test_api_key_required_for_status_only() {
    let router = status_router(seeded(), Some("s3cret".to_string()));

    let (code, _) = get(router.clone(), "/status", None).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);

    let (code, _) = get(router.clone(), "/status", Some("wrong")).await;
    assert_eq!(code, StatusCode::UNAUTHORIZED);

    let (code, _) = get(router.clone(), "/status", Some("s3cret")).await;
    assert_eq!(code, StatusCode::OK);

    let (code, body) = get(router, "/healthz", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["stale"], true);
}

#[tokio::test]
async fn test_empty_snapshot_before_first_tick() {
    let (code, body) = get(status_router(StatusHandle::new(), None), "/status", None).await;

    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["alerts"], serde_json::json!({}));
    assert_eq!(body["stale"], false);
    assert!(body["last_tick"].is_null());
}
