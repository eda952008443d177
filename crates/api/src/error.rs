use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use upback_core::error::CoreError;
use upback_sync::SyncError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`SyncError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce consistent
/// JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `upback_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An engine error from `upback_sync`.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            // Engine errors: domain errors pass through, the rest are internal.
            AppError::Sync(SyncError::Core(core)) => classify_core_error(core),
            AppError::Sync(SyncError::Persistence(err)) | AppError::Database(err) => {
                classify_sqlx_error(err)
            }
            AppError::Sync(other) => internal(other),

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> (StatusCode, &'static str, String) {
    match core {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Duplicate(msg) => (StatusCode::CONFLICT, "DUPLICATE", msg.clone()),
        CoreError::SourceMissing(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "SOURCE_MISSING",
            format!("Source directory missing: {msg}"),
        ),
        CoreError::Internal(msg) => internal(msg),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => (
            StatusCode::CONFLICT,
            "DUPLICATE",
            "Duplicate value violates a unique constraint".to_string(),
        ),
        other => internal(other),
    }
}

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
