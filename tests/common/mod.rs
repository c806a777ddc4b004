//! Shared setup for web integration tests

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt; // for .collect().await
use phish_aware::clock::ManualClock;
use phish_aware::config::Config;
use phish_aware::web::api::{AppState, AppStateInner};
use std::sync::Arc;
use tempfile::TempDir;

#[allow(dead_code)]
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub dir: TempDir,
}

pub fn test_app(max_attempts: usize, debug: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.server.debug = debug;
    config.simulation.max_attempts_per_ip = max_attempts;
    config.simulation.log_path = dir.path().join("simulation_logs.json");
    let clock = Arc::new(ManualClock::new());
    let state = Arc::new(AppStateInner::with_clock(&config, clock.clone()));
    TestApp { state, clock, dir }
}

#[allow(dead_code)]
pub fn capture_request(uri: &str, address: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .header("x-forwarded-for", address)
        .header("user-agent", "TestBrowser/1.0")
        .body(Body::from(form.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
