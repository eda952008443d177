//! Handlers that start syncs or stream their progress.
//!
//! `POST` endpoints dispatch and answer `202 Accepted` right away; the work
//! continues in the background and is observed through `GET /syncs`. The
//! `.../sync/events` endpoints run the same work but report it over the
//! response itself as `progress`/`error`/`done` events.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use futures::StreamExt;
use serde::Serialize;
use upback_core::sync_events::StreamEvent;
use upback_core::types::{AppId, SyncId};

use crate::error::AppResult;
use crate::response::{json_sse, DataResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncStarted {
    pub sync_id: SyncId,
}

#[derive(Debug, Serialize)]
pub struct BatchStarted {
    pub app_count: usize,
}

// ---------------------------------------------------------------------------
// POST /tracked-apps/{id}/sync
// ---------------------------------------------------------------------------

pub async fn sync_app(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
) -> AppResult<impl IntoResponse> {
    let handle = state.coordinator.sync_one(id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SyncStarted {
                sync_id: handle.sync_id,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// POST /tracked-apps/sync
// ---------------------------------------------------------------------------

pub async fn sync_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let batch = state.coordinator.sync_all().await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: BatchStarted {
                app_count: batch.app_count,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /tracked-apps/{id}/sync/events (SSE)
// ---------------------------------------------------------------------------

pub async fn sync_app_events(
    State(state): State<AppState>,
    Path(id): Path<AppId>,
) -> AppResult<impl IntoResponse> {
    let events = state.coordinator.sync_one_events(id).await?;
    Ok(json_sse(events, &state.shutdown))
}

// ---------------------------------------------------------------------------
// GET /tracked-apps/sync/events (SSE)
// ---------------------------------------------------------------------------

pub async fn sync_all_events(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let events = state.coordinator.sync_all_events().await?;
    Ok(json_sse(events, &state.shutdown))
}

// ---------------------------------------------------------------------------
// GET /syncs (SSE)
// ---------------------------------------------------------------------------

/// Snapshot of every in-flight sync, once per second until the client leaves.
pub async fn stream_progress(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots = state.coordinator.progress_stream().map(StreamEvent::progress);
    json_sse(snapshots, &state.shutdown)
}
