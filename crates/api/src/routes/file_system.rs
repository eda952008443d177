use axum::routing::get;
use axum::Router;

use crate::handlers::file_system;
use crate::state::AppState;

/// Directory picker routes, mounted at `/file-system`.
///
/// ```text
/// GET    /                  -> list_directory
/// GET    /api-path          -> get_start_path
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(file_system::list_directory))
        .route("/api-path", get(file_system::get_start_path))
}
