//! Tracked app entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use upback_core::types::{AppId, Timestamp};

/// A row from the `tracked_apps` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct TrackedApp {
    pub id: AppId,
    /// Normalized absolute path, unique across all rows.
    pub path: String,
    /// Eligible for scheduled runs.
    pub auto_update: bool,
    pub cron: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for registering a new tracked app.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrackedApp {
    pub path: String,
    #[serde(default)]
    pub auto_update: bool,
    pub cron: String,
}

/// DTO for updating a tracked app. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrackedApp {
    pub path: Option<String>,
    pub auto_update: Option<bool>,
    pub cron: Option<String>,
}
