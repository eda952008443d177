//! Single-app archive writer.
//!
//! [`Archiver::run`] turns one tracked directory into one deflated zip under
//! `{backups_root}/{app_name}/` and yields a [`SyncStatus`] per file written.
//! It knows nothing about concurrency policy; the coordinator decides when
//! and how often it runs.
//!
//! Effects happen in a fixed order:
//!
//! 1. the ledger record is written, even when the source turns out missing,
//! 2. the source directory is checked,
//! 3. files are enumerated once, fixing `total_files`,
//! 4. each file is appended and reported, then the archive is finalized.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use upback_core::error::CoreError;
use upback_core::paths::{app_backup_dir, app_name, archive_entry_name, archive_path};
use upback_core::sync_events::SyncStatus;
use upback_core::types::{AppId, SyncId};
use upback_db::models::backup::NewBackup;
use upback_db::models::tracked_app::TrackedApp;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{SyncError, SyncResult};
use crate::ledger::Ledger;

/// Progress of one archive run. Ends after the last file, or after the
/// first `Err` item.
pub type ArchiveProgress = ReceiverStream<SyncResult<SyncStatus>>;

/// Files at or above this size need zip64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

#[derive(Clone)]
pub struct Archiver {
    ledger: Ledger,
    backups_root: PathBuf,
}

impl Archiver {
    pub fn new(ledger: Ledger, backups_root: impl Into<PathBuf>) -> Self {
        Self {
            ledger,
            backups_root: backups_root.into(),
        }
    }

    pub fn backups_root(&self) -> &Path {
        &self.backups_root
    }

    /// Start archiving `app` under `sync_id`.
    ///
    /// The returned stream is backed by a single-slot channel, so the writer
    /// is never more than one file ahead of the consumer. Dropping the
    /// stream stops the run after the file in progress.
    pub fn run(&self, app: &TrackedApp, sync_id: SyncId) -> ArchiveProgress {
        let (tx, rx) = mpsc::channel(1);
        let ledger = self.ledger.clone();
        let backups_root = self.backups_root.clone();
        let app = app.clone();

        tokio::spawn(async move {
            if let Err(e) = archive(ledger, backups_root, app, sync_id, tx.clone()).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        ReceiverStream::new(rx)
    }
}

async fn archive(
    ledger: Ledger,
    backups_root: PathBuf,
    app: TrackedApp,
    sync_id: SyncId,
    tx: mpsc::Sender<SyncResult<SyncStatus>>,
) -> SyncResult<()> {
    let name = app_name(&app.path)?;
    let destination = archive_path(&backups_root, &name, sync_id);

    ledger
        .record(NewBackup {
            id: sync_id,
            app_id: app.id,
            archive_path: destination.to_string_lossy().into_owned(),
            timestamp: Utc::now(),
        })
        .await?;

    let source = PathBuf::from(&app.path);
    let is_dir = tokio::fs::metadata(&source)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(CoreError::SourceMissing(app.path.clone()).into());
    }

    tracing::info!(app_id = %app.id, %sync_id, archive = %destination.display(), "Archive run started");

    let job = ArchiveJob {
        app_id: app.id,
        source,
        backup_dir: app_backup_dir(&backups_root, &name),
        app_name: name,
        destination,
    };
    tokio::task::spawn_blocking(move || job.write(&tx))
        .await
        .map_err(|e| SyncError::TaskJoin(e.to_string()))??;

    tracing::info!(app_id = %app.id, %sync_id, "Archive run finished");
    Ok(())
}

/// The blocking half of a run: enumeration and zip writing.
struct ArchiveJob {
    app_id: AppId,
    source: PathBuf,
    backup_dir: PathBuf,
    app_name: String,
    destination: PathBuf,
}

impl ArchiveJob {
    fn write(self, tx: &mpsc::Sender<SyncResult<SyncStatus>>) -> SyncResult<()> {
        std::fs::create_dir_all(&self.backup_dir)?;
        let files = self.enumerate()?;
        let total_files = files.len() as u64;

        let mut zip = ZipWriter::new(BufWriter::new(File::create(&self.destination)?));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (position, path) in files.iter().enumerate() {
            let relative = path.strip_prefix(&self.source).map_err(|_| {
                CoreError::Internal(format!(
                    "{} escaped source directory {}",
                    path.display(),
                    self.source.display()
                ))
            })?;
            let mut input = File::open(path)?;
            let size = input.metadata()?.len();

            zip.start_file(
                archive_entry_name(&self.app_name, relative),
                options.large_file(size >= ZIP64_THRESHOLD),
            )?;
            io::copy(&mut input, &mut zip)?;

            let status = SyncStatus {
                app_id: self.app_id,
                current_file_index: position as u64 + 1,
                total_files,
                current_file_path: path.to_string_lossy().into_owned(),
            };
            if tx.blocking_send(Ok(status)).is_err() {
                return Err(CoreError::Internal("Progress consumer went away".into()).into());
            }
        }

        zip.finish()?.flush()?;
        Ok(())
    }

    /// Regular files under the source, sorted by name at every level.
    ///
    /// A symlink to a file is archived with the target's contents; symlinked
    /// directories are not descended and dangling links are skipped. When the
    /// backup directory sits inside the source tree it is skipped so archives
    /// never contain older archives.
    fn enumerate(&self) -> SyncResult<Vec<PathBuf>> {
        let backup_dir =
            std::fs::canonicalize(&self.backup_dir).unwrap_or_else(|_| self.backup_dir.clone());

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.source)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !entry.path().starts_with(&backup_dir));
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            let file_type = entry.file_type();
            if file_type.is_file() || (file_type.is_symlink() && entry.path().is_file()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}
