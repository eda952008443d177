use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Local;
use serde::Serialize;
use upback_core::cron::sort_by_next_fire;
use upback_db::models::tracked_app::TrackedApp;
use upback_sync::ledger::{summarize, StorageSummary};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Overview shown on the landing page.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    /// Every tracked app, soonest next fire first.
    pub tracked_apps: Vec<TrackedApp>,
    pub tracked_apps_amount: usize,
    pub tracked_apps_enabled: usize,
    pub backups_amount: usize,
    /// Only archives still present on disk are counted here.
    pub storage: StorageSummary,
    pub syncs_in_flight: usize,
}

/// GET /dashboard
pub async fn get_dashboard(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let mut tracked_apps = state.registry.list().await?;
    sort_by_next_fire(&mut tracked_apps, &Local::now(), |app| app.cron.as_str());

    let backups = state.ledger.list_all().await?;
    let storage = summarize(&backups).await;

    let dashboard = Dashboard {
        tracked_apps_amount: tracked_apps.len(),
        tracked_apps_enabled: tracked_apps.iter().filter(|app| app.auto_update).count(),
        tracked_apps,
        backups_amount: backups.len(),
        storage,
        syncs_in_flight: state.coordinator.progress().len(),
    };
    Ok(Json(DataResponse { data: dashboard }))
}
