//! Append-only ledger of backup runs.
//!
//! A record is written before its archive, so a row whose archive is
//! missing or truncated on disk marks an interrupted run. This module only
//! reports that state; it never repairs or deletes anything.

use std::path::Path;

use serde::Serialize;
use upback_core::error::CoreError;
use upback_core::paths::archive_file_name;
use upback_core::types::{AppId, SyncId, Timestamp};
use upback_db::models::backup::{Backup, NewBackup};
use upback_db::repositories::BackupRepo;
use upback_db::DbPool;

use crate::error::SyncResult;

const BYTES_PER_GB: u64 = 1_000_000_000;
const BYTES_PER_MB: f64 = 1_000_000.0;

/// Metadata of an archive that is present on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveFileInfo {
    pub backup_id: SyncId,
    pub file_name: String,
    pub size_bytes: u64,
}

/// Aggregate of the archives that could be found on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageSummary {
    pub files_found: usize,
    pub total_bytes: u64,
    pub human_size: String,
}

/// A backup as exposed to clients: file name only, no directory prefix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupSummary {
    pub backup_id: SyncId,
    pub file_name: String,
    pub timestamp: Timestamp,
}

impl From<&Backup> for BackupSummary {
    fn from(backup: &Backup) -> Self {
        Self {
            backup_id: backup.id,
            file_name: archive_file_name(&backup.archive_path),
            timestamp: backup.timestamp,
        }
    }
}

#[derive(Clone)]
pub struct Ledger {
    pool: DbPool,
}

impl Ledger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append one record. Errors are logged and returned; nothing retries.
    pub async fn record(&self, input: NewBackup) -> SyncResult<Backup> {
        match BackupRepo::create(&self.pool, &input).await {
            Ok(backup) => {
                tracing::debug!(backup_id = %backup.id, app_id = %backup.app_id, archive = %backup.archive_path, "Backup recorded");
                Ok(backup)
            }
            Err(e) => {
                tracing::error!(backup_id = %input.id, app_id = %input.app_id, error = %e, "Failed to record backup");
                Err(e.into())
            }
        }
    }

    pub async fn get(&self, id: SyncId) -> SyncResult<Backup> {
        BackupRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Backup", id).into())
    }

    pub async fn list_for_app(&self, app_id: AppId) -> SyncResult<Vec<Backup>> {
        Ok(BackupRepo::list_for_app(&self.pool, app_id).await?)
    }

    pub async fn list_all(&self) -> SyncResult<Vec<Backup>> {
        Ok(BackupRepo::list(&self.pool).await?)
    }
}

/// Stat the archive of `backup`. `None` when the file is gone.
pub async fn archive_info(backup: &Backup) -> Option<ArchiveFileInfo> {
    let metadata = tokio::fs::metadata(Path::new(&backup.archive_path))
        .await
        .ok()?;
    if !metadata.is_file() {
        return None;
    }
    Some(ArchiveFileInfo {
        backup_id: backup.id,
        file_name: archive_file_name(&backup.archive_path),
        size_bytes: metadata.len(),
    })
}

/// Collect on-disk info for every backup and total their size.
pub async fn summarize(backups: &[Backup]) -> StorageSummary {
    let mut files_found = 0;
    let mut total_bytes = 0;
    for backup in backups {
        if let Some(info) = archive_info(backup).await {
            files_found += 1;
            total_bytes += info.size_bytes;
        }
    }
    StorageSummary {
        files_found,
        total_bytes,
        human_size: human_size(total_bytes),
    }
}

/// Decimal units: `"1.50 GB"` from one gigabyte up, `"12.34 MB"` below.
pub fn human_size(bytes: u64) -> String {
    if bytes >= BYTES_PER_GB {
        format!("{:.2} GB", bytes as f64 / BYTES_PER_GB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / BYTES_PER_MB)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn human_size_switches_units_at_one_gigabyte() {
        assert_eq!(human_size(0), "0.00 MB");
        assert_eq!(human_size(12_340_000), "12.34 MB");
        assert_eq!(human_size(999_999_999), "1000.00 MB");
        assert_eq!(human_size(1_500_000_000), "1.50 GB");
    }

    #[test]
    fn summary_strips_directory_prefix() {
        let id = Uuid::new_v4();
        let backup = Backup {
            id,
            app_id: Uuid::new_v4(),
            archive_path: format!("/srv/backups/site/{id}_site.zip"),
            timestamp: Utc::now(),
        };
        let summary = BackupSummary::from(&backup);
        assert_eq!(summary.file_name, format!("{id}_site.zip"));
        assert_eq!(summary.backup_id, id);
    }

    #[tokio::test]
    async fn missing_archive_has_no_info() {
        let backup = Backup {
            id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            archive_path: "/definitely/not/here.zip".into(),
            timestamp: Utc::now(),
        };
        assert!(archive_info(&backup).await.is_none());
        let summary = summarize(&[backup]).await;
        assert_eq!(summary.files_found, 0);
        assert_eq!(summary.human_size, "0.00 MB");
    }
}
