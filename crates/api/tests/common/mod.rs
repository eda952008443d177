#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use upback_api::config::ServerConfig;
use upback_api::router::build_app_router;
use upback_api::state::AppState;
use upback_sync::SyncConfig;

/// A router wired to a throwaway database and backups root.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sources: TempDir,
    pub backups: TempDir,
    _db: TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(database_url: String, backups_root: PathBuf) -> ServerConfig {
    let mut sync = SyncConfig::new(backups_root);
    sync.progress_interval = Duration::from_millis(20);
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url,
        sync,
    }
}

/// Build the full application router with all middleware layers, exactly as
/// `main.rs` does.
pub async fn build_test_app() -> TestApp {
    let db = tempfile::tempdir().expect("create db dir");
    let backups = tempfile::tempdir().expect("create backups dir");
    let sources = tempfile::tempdir().expect("create sources dir");

    let url = format!("sqlite://{}", db.path().join("upback.db").display());
    let pool = upback_db::create_pool(&url).await.expect("create pool");
    upback_db::run_migrations(&pool)
        .await
        .expect("run migrations");

    let config = test_config(url, backups.path().to_path_buf());
    let state = AppState::new(pool, config.clone());
    let router = build_app_router(state.clone(), &config);

    TestApp {
        router,
        state,
        sources,
        backups,
        _db: db,
    }
}

impl TestApp {
    /// Create `name` under the sources dir with one file per entry.
    pub fn tree(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let root = self.sources.path().join(name);
        std::fs::create_dir_all(&root).expect("create tree root");
        for (relative, body) in files {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create parent");
            }
            std::fs::write(path, body).expect("write file");
        }
        root
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    /// Send a request and parse the body as JSON (`Value::Null` when empty).
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body is JSON")
        };
        (status, json)
    }

    /// Register `path` through the API and return the created record.
    pub async fn register(&self, path: &std::path::Path, auto_update: bool, cron: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/v1/tracked-apps",
                serde_json::json!({
                    "path": path.to_string_lossy(),
                    "auto_update": auto_update,
                    "cron": cron,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["data"].clone()
    }
}

/// Read an SSE response body until the server closes it and return the JSON
/// of every `data:` line.
pub async fn read_sse(router: &Router, uri: &str) -> Vec<Value> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let response = router.clone().oneshot(request).await.expect("send request");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = tokio::time::timeout(Duration::from_secs(5), response.into_body().collect())
        .await
        .expect("stream did not end")
        .expect("read body")
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("utf-8 body");
    text.lines()
        .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(|data| serde_json::from_str(data).expect("event data is JSON"))
        .collect()
}

/// Read the first `data:` frame of a never-ending SSE response.
pub async fn first_sse_frame(router: &Router, uri: &str) -> Value {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let response = router.clone().oneshot(request).await.expect("send request");
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let mut buffer = String::new();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(3), body.frame())
            .await
            .expect("no SSE frame in time")
            .expect("stream ended")
            .expect("read frame");
        if let Ok(data) = frame.into_data() {
            buffer.push_str(&String::from_utf8_lossy(&data));
        }
        if let Some(line) = buffer
            .lines()
            .find_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        {
            return serde_json::from_str(line).expect("event data is JSON");
        }
    }
}
