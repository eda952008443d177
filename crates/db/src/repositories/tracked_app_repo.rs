//! Repository for the `tracked_apps` table.
//!
//! Inputs are expected to be validated and normalized already; this layer
//! only enforces what the schema enforces (primary key, unique path).

use chrono::Utc;
use upback_core::types::AppId;

use crate::models::tracked_app::{CreateTrackedApp, TrackedApp, UpdateTrackedApp};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, path, auto_update, cron, created_at, updated_at";

/// Provides CRUD operations for tracked apps.
pub struct TrackedAppRepo;

impl TrackedAppRepo {
    /// Insert a new tracked app, returning the created row.
    pub async fn create(
        pool: &DbPool,
        id: AppId,
        input: &CreateTrackedApp,
    ) -> Result<TrackedApp, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO tracked_apps (id, path, auto_update, cron, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrackedApp>(&query)
            .bind(id)
            .bind(&input.path)
            .bind(input.auto_update)
            .bind(&input.cron)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a tracked app by its ID.
    pub async fn find_by_id(pool: &DbPool, id: AppId) -> Result<Option<TrackedApp>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracked_apps WHERE id = $1");
        sqlx::query_as::<_, TrackedApp>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a tracked app by its exact (already normalized) path.
    pub async fn find_by_path(
        pool: &DbPool,
        path: &str,
    ) -> Result<Option<TrackedApp>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracked_apps WHERE path = $1");
        sqlx::query_as::<_, TrackedApp>(&query)
            .bind(path)
            .fetch_optional(pool)
            .await
    }

    /// List all tracked apps ordered by path.
    pub async fn list(pool: &DbPool) -> Result<Vec<TrackedApp>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tracked_apps ORDER BY path");
        sqlx::query_as::<_, TrackedApp>(&query).fetch_all(pool).await
    }

    /// Update a tracked app. Only non-`None` fields are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &DbPool,
        id: AppId,
        input: &UpdateTrackedApp,
    ) -> Result<Option<TrackedApp>, sqlx::Error> {
        let query = format!(
            "UPDATE tracked_apps SET \
                path = COALESCE($2, path), \
                auto_update = COALESCE($3, auto_update), \
                cron = COALESCE($4, cron), \
                updated_at = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TrackedApp>(&query)
            .bind(id)
            .bind(&input.path)
            .bind(input.auto_update)
            .bind(&input.cron)
            .bind(Utc::now())
            .fetch_optional(pool)
            .await
    }

    /// Delete a tracked app. Returns `true` if a row was removed.
    pub async fn delete(pool: &DbPool, id: AppId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tracked_apps WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
