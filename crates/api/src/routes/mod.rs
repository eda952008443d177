pub mod dashboard;
pub mod file_system;
pub mod health;
pub mod tracked_apps;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` request/response routes.
///
/// Route hierarchy:
///
/// ```text
/// /tracked-apps                          list, register
/// /tracked-apps/sync                     sync every app (POST, 202)
/// /tracked-apps/{id}                     get, update, delete
/// /tracked-apps/{id}/status              enabled flag
/// /tracked-apps/{id}/backups             backups with file names
/// /tracked-apps/{id}/sync                sync one app (POST, 202)
///
/// /file-system                           subdirectories of ?path=
/// /file-system/api-path                  starting directory for the picker
///
/// /dashboard                             counts and storage summary
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/tracked-apps", tracked_apps::router())
        .nest("/file-system", file_system::router())
        .nest("/dashboard", dashboard::router())
}

/// Build the `/api/v1` server-sent event routes.
///
/// Kept apart from [`api_routes`] so the request timeout does not cut
/// long-lived streams.
///
/// ```text
/// /syncs                                 progress snapshots, every second
/// /tracked-apps/sync/events              run every app, legacy event stream
/// /tracked-apps/{id}/sync/events         run one app, legacy event stream
/// /tracked-apps/{id}/next-cron           countdown to the next fire
/// ```
pub fn stream_routes() -> Router<AppState> {
    Router::new()
        .route("/syncs", get(handlers::syncs::stream_progress))
        .route(
            "/tracked-apps/sync/events",
            get(handlers::syncs::sync_all_events),
        )
        .route(
            "/tracked-apps/{id}/sync/events",
            get(handlers::syncs::sync_app_events),
        )
        .route(
            "/tracked-apps/{id}/next-cron",
            get(handlers::tracked_apps::stream_next_cron),
        )
}
