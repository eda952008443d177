//! Backup ledger entity model.

use serde::Serialize;
use sqlx::FromRow;
use upback_core::types::{AppId, SyncId, Timestamp};

/// A row from the `backups` table. Written once, never updated.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Backup {
    /// Same value as the sync id of the run that produced it.
    pub id: SyncId,
    pub app_id: AppId,
    pub archive_path: String,
    pub timestamp: Timestamp,
}

/// DTO for appending a ledger record.
#[derive(Debug, Clone)]
pub struct NewBackup {
    pub id: SyncId,
    pub app_id: AppId,
    pub archive_path: String,
    pub timestamp: Timestamp,
}
