use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{syncs, tracked_apps};
use crate::state::AppState;

/// Tracked app routes, mounted at `/tracked-apps`.
///
/// ```text
/// GET    /                  -> list_tracked_apps
/// POST   /                  -> create_tracked_app
/// POST   /sync              -> sync_all
/// GET    /{id}              -> get_tracked_app
/// PUT    /{id}              -> update_tracked_app
/// DELETE /{id}              -> delete_tracked_app
/// GET    /{id}/status       -> get_status
/// GET    /{id}/backups      -> list_backups
/// POST   /{id}/sync         -> sync_app
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(tracked_apps::list_tracked_apps).post(tracked_apps::create_tracked_app),
        )
        .route("/sync", post(syncs::sync_all))
        .route(
            "/{id}",
            get(tracked_apps::get_tracked_app)
                .put(tracked_apps::update_tracked_app)
                .delete(tracked_apps::delete_tracked_app),
        )
        .route("/{id}/status", get(tracked_apps::get_status))
        .route("/{id}/backups", get(tracked_apps::list_backups))
        .route("/{id}/sync", post(syncs::sync_app))
}
