//! Directory picker backing the "add tracked app" form.

use std::path::{Path, PathBuf};

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use upback_core::error::CoreError;
use upback_core::paths::normalize_path;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct DirectoryListing {
    pub path: String,
    /// `None` at the filesystem root.
    pub parent: Option<String>,
    pub directories: Vec<DirectoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct StartPath {
    pub path: String,
}

// ---------------------------------------------------------------------------
// GET /file-system/api-path
// ---------------------------------------------------------------------------

pub async fn get_start_path(State(_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let path = start_dir().to_string_lossy().into_owned();
    Ok(Json(DataResponse {
        data: StartPath { path },
    }))
}

// ---------------------------------------------------------------------------
// GET /file-system?path=
// ---------------------------------------------------------------------------

/// Immediate subdirectories of `path` (the home directory when omitted),
/// sorted by name. Files and unreadable entries are left out.
pub async fn list_directory(
    State(_state): State<AppState>,
    Query(params): Query<DirectoryQuery>,
) -> AppResult<impl IntoResponse> {
    let dir = match params.path.as_deref() {
        Some(raw) if !raw.trim().is_empty() => PathBuf::from(normalize_path(raw)?),
        _ => start_dir(),
    };

    let metadata = tokio::fs::metadata(&dir).await.ok();
    if !metadata.is_some_and(|m| m.is_dir()) {
        return Err(AppError::Core(CoreError::not_found(
            "Directory",
            dir.display(),
        )));
    }

    let listing = DirectoryListing {
        path: dir.to_string_lossy().into_owned(),
        parent: dir.parent().map(|p| p.to_string_lossy().into_owned()),
        directories: subdirectories(&dir).await?,
    };
    Ok(Json(DataResponse { data: listing }))
}

fn start_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

async fn subdirectories(dir: &Path) -> AppResult<Vec<DirectoryEntry>> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
        AppError::BadRequest(format!("Cannot read directory {}: {e}", dir.display()))
    })?;

    let mut directories = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if is_dir {
            directories.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path().to_string_lossy().into_owned(),
            });
        }
    }

    directories.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(directories)
}
