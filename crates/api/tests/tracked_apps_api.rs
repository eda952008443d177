//! Integration tests for the `/api/v1/tracked-apps` CRUD surface.

mod common;

use axum::http::StatusCode;
use common::build_test_app;
use serde_json::json;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Test: register returns 201 with the normalized record and schedules it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_returns_created_and_schedules_job() {
    let app = build_test_app().await;
    let site = app.tree("site", &[("index.html", "<html/>")]);

    let (status, body) = app
        .post(
            "/api/v1/tracked-apps",
            json!({
                "path": format!("{}/", site.display()),
                "auto_update": true,
                "cron": "0  3 * * *",
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = &body["data"];
    let canonical = std::fs::canonicalize(&site).unwrap();
    assert_eq!(data["path"], json!(canonical.to_string_lossy()));
    assert_eq!(data["cron"], "0 3 * * *");
    assert_eq!(data["auto_update"], true);

    let id: Uuid = serde_json::from_value(data["id"].clone()).unwrap();
    assert!(app.state.scheduler.job(id).await.is_some());
}

// ---------------------------------------------------------------------------
// Test: duplicate path is rejected with 409
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_path_returns_conflict() {
    let app = build_test_app().await;
    let site = app.tree("site", &[]);
    app.register(&site, true, "* * * * *").await;

    let (status, body) = app
        .post(
            "/api/v1/tracked-apps",
            json!({ "path": format!("{}/./", site.display()), "cron": "* * * * *" }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "DUPLICATE");
}

// ---------------------------------------------------------------------------
// Test: malformed cron is rejected with 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_cron_returns_bad_request() {
    let app = build_test_app().await;
    let site = app.tree("site", &[]);

    let (status, body) = app
        .post(
            "/api/v1/tracked-apps",
            json!({ "path": site.to_string_lossy(), "cron": "* * * *" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("5 fields"));
}

// ---------------------------------------------------------------------------
// Test: list is sorted by next fire time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_is_sorted_by_next_fire() {
    let app = build_test_app().await;
    // Yearly on Jan 1st vs. every minute: the minute job always fires first.
    let yearly = app.register(&app.tree("a", &[]), true, "0 0 1 1 *").await;
    let minutely = app.register(&app.tree("b", &[]), true, "* * * * *").await;

    let (status, body) = app.get("/api/v1/tracked-apps").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].clone())
        .collect();
    assert_eq!(ids, vec![minutely["id"].clone(), yearly["id"].clone()]);
}

// ---------------------------------------------------------------------------
// Test: get / update / status / delete round
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_disables_and_unschedules() {
    let app = build_test_app().await;
    let created = app.register(&app.tree("site", &[]), true, "* * * * *").await;
    let id = created["id"].as_str().unwrap().to_string();
    let uuid: Uuid = id.parse().unwrap();

    let (status, body) = app.get(&format!("/api/v1/tracked-apps/{id}/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], true);

    let (status, body) = app
        .put(
            &format!("/api/v1/tracked-apps/{id}"),
            json!({ "auto_update": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["auto_update"], false);
    assert_eq!(body["data"]["cron"], "* * * * *");

    let (_, body) = app.get(&format!("/api/v1/tracked-apps/{id}/status")).await;
    assert_eq!(body["data"]["enabled"], false);
    assert!(app.state.scheduler.job(uuid).await.is_none());
}

#[tokio::test]
async fn delete_returns_no_content_then_not_found() {
    let app = build_test_app().await;
    let created = app.register(&app.tree("site", &[]), true, "* * * * *").await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app.delete(&format!("/api/v1/tracked-apps/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert!(app.state.scheduler.jobs().await.is_empty());

    let (status, body) = app.get(&format!("/api/v1/tracked-apps/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app.delete(&format!("/api/v1/tracked-apps/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_id_is_not_found_everywhere() {
    let app = build_test_app().await;
    let id = Uuid::new_v4();

    for uri in [
        format!("/api/v1/tracked-apps/{id}"),
        format!("/api/v1/tracked-apps/{id}/status"),
        format!("/api/v1/tracked-apps/{id}/backups"),
    ] {
        let (status, body) = app.get(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    let (status, _) = app
        .put(
            &format!("/api/v1/tracked-apps/{id}"),
            json!({ "cron": "* * * * *" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
