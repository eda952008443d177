//! Handlers for tracked app CRUD, status, backups and the next-fire countdown.
//!
//! Every successful mutation reloads the cron scheduler before answering.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Local;
use futures::StreamExt;
use serde::Serialize;
use upback_core::cron::{sort_by_next_fire, CronSchedule};
use upback_core::sync_events::StreamEvent;
use upback_core::types::AppId;
use upback_db::models::tracked_app::{CreateTrackedApp, UpdateTrackedApp};
use upback_sync::scheduler::countdown_stream;

use crate::error::AppResult;
use crate::response::{json_sse, DataResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub enabled: bool,
}

// ---------------------------------------------------------------------------
// GET /tracked-apps
// ---------------------------------------------------------------------------

/// List every tracked app, soonest next fire first.
pub async fn list_tracked_apps(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut apps = state.registry.list().await?;
    sort_by_next_fire(&mut apps, &Local::now(), |app| app.cron.as_str());
    Ok(Json(DataResponse { data: apps }))
}

// ---------------------------------------------------------------------------
// POST /tracked-apps
// ---------------------------------------------------------------------------

pub async fn create_tracked_app(
    State(state): State<AppState>,
    Json(input): Json<CreateTrackedApp>,
) -> AppResult<impl IntoResponse> {
    let app = state.registry.register(input).await?;
    state.reload_schedule().await;
    Ok((StatusCode::CREATED, Json(DataResponse { data: app })))
}

// ---------------------------------------------------------------------------
// GET /tracked-apps/{id}
// ---------------------------------------------------------------------------

pub async fn get_tracked_app(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
) -> AppResult<impl IntoResponse> {
    let app = state.registry.get(id).await?;
    Ok(Json(DataResponse { data: app }))
}

// ---------------------------------------------------------------------------
// PUT /tracked-apps/{id}
// ---------------------------------------------------------------------------

/// Partially update a tracked app. Omitted fields keep their value.
pub async fn update_tracked_app(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
    Json(input): Json<UpdateTrackedApp>,
) -> AppResult<impl IntoResponse> {
    let app = state.registry.update(id, input).await?;
    state.reload_schedule().await;
    Ok(Json(DataResponse { data: app }))
}

// ---------------------------------------------------------------------------
// DELETE /tracked-apps/{id}
// ---------------------------------------------------------------------------

/// Stop tracking a directory. Existing archives and ledger rows are kept.
pub async fn delete_tracked_app(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
) -> AppResult<StatusCode> {
    state.registry.delete(id).await?;
    state.reload_schedule().await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /tracked-apps/{id}/status
// ---------------------------------------------------------------------------

pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
) -> AppResult<impl IntoResponse> {
    let enabled = state.registry.is_enabled(id).await?;
    Ok(Json(DataResponse {
        data: StatusResponse { enabled },
    }))
}

// ---------------------------------------------------------------------------
// GET /tracked-apps/{id}/backups
// ---------------------------------------------------------------------------

/// Backups of one app, newest first, with file names only.
pub async fn list_backups(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
) -> AppResult<impl IntoResponse> {
    let backups = state.coordinator.list_backups(id).await?;
    Ok(Json(DataResponse { data: backups }))
}

// ---------------------------------------------------------------------------
// GET /tracked-apps/{id}/next-cron (SSE)
// ---------------------------------------------------------------------------

/// Stream a once-per-second countdown to the app's next scheduled fire.
pub async fn stream_next_cron(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
) -> AppResult<impl IntoResponse> {
    let app = state.registry.get(id).await?;
    let schedule = CronSchedule::parse(&app.cron)?;
    let ticks = countdown_stream(schedule).map(StreamEvent::progress);
    Ok(json_sse(ticks, &state.shutdown))
}
