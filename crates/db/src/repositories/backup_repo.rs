//! Repository for the append-only `backups` table.

use upback_core::types::{AppId, SyncId};

use crate::models::backup::{Backup, NewBackup};
use crate::DbPool;

const COLUMNS: &str = "id, app_id, archive_path, timestamp";

/// Insert and read operations for backup records. Rows are never updated
/// or deleted.
pub struct BackupRepo;

impl BackupRepo {
    /// Append a backup record, returning the stored row.
    pub async fn create(pool: &DbPool, input: &NewBackup) -> Result<Backup, sqlx::Error> {
        let query = format!(
            "INSERT INTO backups (id, app_id, archive_path, timestamp) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Backup>(&query)
            .bind(input.id)
            .bind(input.app_id)
            .bind(&input.archive_path)
            .bind(input.timestamp)
            .fetch_one(pool)
            .await
    }

    /// Find a backup record by its ID.
    pub async fn find_by_id(pool: &DbPool, id: SyncId) -> Result<Option<Backup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM backups WHERE id = $1");
        sqlx::query_as::<_, Backup>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the backups of one app, newest first.
    pub async fn list_for_app(pool: &DbPool, app_id: AppId) -> Result<Vec<Backup>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM backups WHERE app_id = $1 ORDER BY timestamp DESC"
        );
        sqlx::query_as::<_, Backup>(&query)
            .bind(app_id)
            .fetch_all(pool)
            .await
    }

    /// List every backup record, newest first.
    pub async fn list(pool: &DbPool) -> Result<Vec<Backup>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM backups ORDER BY timestamp DESC");
        sqlx::query_as::<_, Backup>(&query).fetch_all(pool).await
    }
}
