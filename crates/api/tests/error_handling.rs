//! Tests for the `AppError` -> JSON response mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use serde_json::Value;
use upback_api::error::AppError;
use upback_core::error::CoreError;
use upback_sync::SyncError;

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn core_errors_map_to_statuses() {
    let cases = [
        (CoreError::not_found("TrackedApp", 7), StatusCode::NOT_FOUND, "NOT_FOUND"),
        (CoreError::Validation("bad".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        (CoreError::Duplicate("dup".into()), StatusCode::CONFLICT, "DUPLICATE"),
        (
            CoreError::SourceMissing("/srv/gone".into()),
            StatusCode::UNPROCESSABLE_ENTITY,
            "SOURCE_MISSING",
        ),
        (
            CoreError::Internal("boom".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
        ),
    ];

    for (err, expected_status, expected_code) in cases {
        let (status, body) = render(AppError::Core(err)).await;
        assert_eq!(status, expected_status);
        assert_eq!(body["code"], expected_code);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn wrapped_engine_errors_keep_their_domain_status() {
    let (status, body) = render(AppError::Sync(SyncError::Core(CoreError::Duplicate(
        "Path '/srv/site' is already tracked".into(),
    ))))
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Path '/srv/site' is already tracked");
}

#[tokio::test]
async fn internal_details_are_not_leaked() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "/secret/path");
    let (status, body) = render(AppError::Sync(SyncError::Io(io))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An internal error occurred");

    let (status, _) = render(AppError::Database(sqlx::Error::RowNotFound)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_request_passes_message_through() {
    let (status, body) = render(AppError::BadRequest("nope".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, serde_json::json!({ "error": "nope", "code": "BAD_REQUEST" }));
}
