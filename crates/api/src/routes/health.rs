//! Root-level liveness endpoint, mounted outside `/api/v1`.
//!
//! Reports `degraded` when either the database or the backups root is
//! unusable; the scheduler and progress counters are informational.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// The backups root exists and is a directory.
    pub backups_root_ready: bool,
    pub scheduled_jobs: usize,
    pub syncs_in_flight: usize,
}

// GET /health
async fn report(State(state): State<AppState>) -> Json<HealthReport> {
    let db_healthy = upback_db::health_check(&state.pool).await.is_ok();
    let backups_root_ready = tokio::fs::metadata(&state.config.sync.backups_root)
        .await
        .is_ok_and(|meta| meta.is_dir());

    Json(HealthReport {
        status: if db_healthy && backups_root_ready { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        backups_root_ready,
        scheduled_jobs: state.scheduler.jobs().await.len(),
        syncs_in_flight: state.coordinator.progress().len(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(report))
}
