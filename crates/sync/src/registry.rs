//! Registry of tracked apps.
//!
//! Owns the two write-time invariants of a [`TrackedApp`]: its path is
//! normalized and unique, and its cron expression parses as five fields.
//! Callers must reload the cron scheduler after every successful mutation.

use upback_core::cron::CronSchedule;
use upback_core::error::CoreError;
use upback_core::paths::{app_name, normalize_path};
use upback_core::types::AppId;
use upback_db::models::tracked_app::{CreateTrackedApp, TrackedApp, UpdateTrackedApp};
use upback_db::repositories::TrackedAppRepo;
use upback_db::DbPool;
use uuid::Uuid;

use crate::error::SyncResult;

const ENTITY: &str = "TrackedApp";

/// Validating front of the `tracked_apps` table.
#[derive(Clone)]
pub struct Registry {
    pool: DbPool,
}

impl Registry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Register a new directory.
    ///
    /// Fails with `Validation` on a malformed cron or unusable path and with
    /// `Duplicate` when the normalized path is already tracked. Existing
    /// records are never overwritten.
    pub async fn register(&self, input: CreateTrackedApp) -> SyncResult<TrackedApp> {
        let cron = CronSchedule::parse(&input.cron)?;
        let path = normalized_directory(&input.path)?;

        if TrackedAppRepo::find_by_path(&self.pool, &path).await?.is_some() {
            return Err(duplicate(&path).into());
        }

        let normalized = CreateTrackedApp {
            path,
            auto_update: input.auto_update,
            cron: cron.as_str().to_string(),
        };
        let app = TrackedAppRepo::create(&self.pool, Uuid::new_v4(), &normalized)
            .await
            .map_err(|e| unique_to_duplicate(e, &normalized.path))?;

        tracing::info!(app_id = %app.id, path = %app.path, cron = %app.cron, "Tracked app registered");
        Ok(app)
    }

    pub async fn get(&self, id: AppId) -> SyncResult<TrackedApp> {
        TrackedAppRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, id).into())
    }

    /// Look up by path. The argument is normalized first, so any spelling of
    /// the same directory finds the record.
    pub async fn get_by_path(&self, path: &str) -> SyncResult<TrackedApp> {
        let path = normalize_path(path)?;
        TrackedAppRepo::find_by_path(&self.pool, &path)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, path).into())
    }

    pub async fn list(&self) -> SyncResult<Vec<TrackedApp>> {
        Ok(TrackedAppRepo::list(&self.pool).await?)
    }

    /// Whether the app takes part in scheduled runs.
    pub async fn is_enabled(&self, id: AppId) -> SyncResult<bool> {
        Ok(self.get(id).await?.auto_update)
    }

    /// Apply a partial update, re-validating any supplied cron or path under
    /// the same rules as [`register`](Self::register).
    pub async fn update(&self, id: AppId, input: UpdateTrackedApp) -> SyncResult<TrackedApp> {
        let existing = self.get(id).await?;

        let cron = match input.cron.as_deref() {
            Some(expr) => Some(CronSchedule::parse(expr)?.as_str().to_string()),
            None => None,
        };

        let path = match input.path.as_deref() {
            Some(raw) => {
                let path = normalized_directory(raw)?;
                if let Some(owner) = TrackedAppRepo::find_by_path(&self.pool, &path).await? {
                    if owner.id != existing.id {
                        return Err(duplicate(&path).into());
                    }
                }
                Some(path)
            }
            None => None,
        };

        let normalized = UpdateTrackedApp {
            path,
            auto_update: input.auto_update,
            cron,
        };
        let target_path = normalized.path.clone().unwrap_or(existing.path);
        let app = TrackedAppRepo::update(&self.pool, id, &normalized)
            .await
            .map_err(|e| unique_to_duplicate(e, &target_path))?
            .ok_or_else(|| CoreError::not_found(ENTITY, id))?;

        tracing::info!(app_id = %app.id, path = %app.path, cron = %app.cron, auto_update = app.auto_update, "Tracked app updated");
        Ok(app)
    }

    /// Remove a tracked app. Its backup records stay in the ledger.
    pub async fn delete(&self, id: AppId) -> SyncResult<()> {
        if !TrackedAppRepo::delete(&self.pool, id).await? {
            return Err(CoreError::not_found(ENTITY, id).into());
        }
        tracing::info!(app_id = %id, "Tracked app deleted");
        Ok(())
    }
}

fn normalized_directory(raw: &str) -> Result<String, CoreError> {
    let path = normalize_path(raw)?;
    app_name(&path)?;
    Ok(path)
}

fn duplicate(path: &str) -> CoreError {
    CoreError::Duplicate(format!("Path '{path}' is already tracked"))
}

/// A concurrent registration can slip past the lookup; the unique index
/// still catches it.
fn unique_to_duplicate(err: sqlx::Error, path: &str) -> crate::error::SyncError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => duplicate(path).into(),
        _ => err.into(),
    }
}
