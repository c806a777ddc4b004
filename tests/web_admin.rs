mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, capture_request, test_app};
use phish_aware::attempt_log::AttemptLogger;
use phish_aware::web::api::app_with_state;
use tower::ServiceExt; // for .oneshot()

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_admin_endpoints_denied_outside_debug() {
    let t = test_app(10, false);
    let app = app_with_state(t.state.clone());
    for uri in ["/admin/logs", "/admin/simulation-logs"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Access denied");
    }
}

#[tokio::test]
async fn test_admin_logs_return_captured_attempts() {
    let t = test_app(100, true);
    let app = app_with_state(t.state.clone());
    for i in 0..3 {
        let form = format!("email=user{}%40example.com&password=pw", i);
        let response = app.clone().oneshot(capture_request("/capture", "192.0.2.1", &form)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = body_json(app.clone().oneshot(get("/admin/logs")).await.unwrap()).await;
    let logs = json.as_array().unwrap();
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[2]["subject_identifier"], "user2@example.com");
    assert!(logs[0].get("password").is_none());

    let json = body_json(app.oneshot(get("/admin/simulation-logs")).await.unwrap()).await;
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_store_logs_survive_restart() {
    let t = test_app(100, true);
    let app = app_with_state(t.state.clone());
    let response = app
        .oneshot(capture_request("/capture", "192.0.2.2", "email=hank%40example.com&password=pw"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let written = t.state.logger.recent(1).await;

    // A fresh logger on the same file sees the record, the in-memory list does not
    let reopened = AttemptLogger::open(t.dir.path().join("simulation_logs.json"));
    assert!(reopened.recent(50).await.is_empty());
    assert_eq!(reopened.recent_from_store(1).await.unwrap(), written);
}

#[tokio::test]
async fn test_admin_memory_view_is_capped() {
    let t = test_app(1000, true);
    let app = app_with_state(t.state.clone());
    for i in 0..60 {
        let form = format!("email=u{}%40example.com&password=pw", i);
        app.clone().oneshot(capture_request("/capture", "192.0.2.3", &form)).await.unwrap();
    }
    let json = body_json(app.oneshot(get("/admin/logs")).await.unwrap()).await;
    let logs = json.as_array().unwrap();
    assert_eq!(logs.len(), 50);
    assert_eq!(logs[0]["subject_identifier"], "u10@example.com");
    assert_eq!(logs[49]["subject_identifier"], "u59@example.com");
}
