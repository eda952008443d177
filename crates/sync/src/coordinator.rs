//! Sync coordinator: dispatches archive runs and exposes their progress.
//!
//! Every dispatch is fire-and-forget: the request returns as soon as the
//! work is spawned, and progress is observed out-of-band through
//! [`SyncCoordinator::progress_stream`]. Spawned tasks are not supervised;
//! the returned [`JoinHandle`]s may simply be dropped.
//!
//! Nothing stops a manual `sync_one` and a scheduled fire from archiving the
//! same app at the same time. Each run has its own sync id, ledger record
//! and archive path, so the two never touch the same state.

use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::{IntervalStream, ReceiverStream};
use upback_core::sync_events::{
    AppProgress, ProgressSnapshot, SyncEvent, SyncReport, STATUS_STARTING, STATUS_SUCCESS,
};
use upback_core::types::{AppId, SyncId};
use upback_db::models::tracked_app::TrackedApp;
use uuid::Uuid;

use crate::archiver::Archiver;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::ledger::{BackupSummary, Ledger};
use crate::progress::ProgressTable;
use crate::registry::Registry;

/// Buffer of the legacy event channel. Events are small and a slow reader
/// only delays the batch between apps.
const EVENT_BUFFER: usize = 64;

/// A dispatched single-app sync.
#[derive(Debug)]
pub struct SyncHandle {
    pub sync_id: SyncId,
    /// Resolves to the number of files archived.
    pub task: JoinHandle<SyncResult<u64>>,
}

/// A dispatched batch over every tracked app.
pub struct BatchHandle {
    /// Size of the snapshot taken at dispatch time.
    pub app_count: usize,
    pub task: JoinHandle<SyncReport>,
}

#[derive(Clone)]
pub struct SyncCoordinator {
    registry: Registry,
    ledger: Ledger,
    archiver: Archiver,
    progress: ProgressTable,
    progress_interval: Duration,
}

impl SyncCoordinator {
    /// Build a coordinator with a fresh, empty progress table.
    pub fn new(registry: Registry, ledger: Ledger, config: &SyncConfig) -> Self {
        Self {
            archiver: Archiver::new(ledger.clone(), config.backups_root.clone()),
            registry,
            ledger,
            progress: ProgressTable::new(),
            progress_interval: config.progress_interval,
        }
    }

    pub fn progress(&self) -> &ProgressTable {
        &self.progress
    }

    /// Dispatch one app. Fails synchronously only when the app is unknown.
    pub async fn sync_one(&self, app_id: AppId) -> SyncResult<SyncHandle> {
        let app = self.registry.get(app_id).await?;
        let sync_id = Uuid::new_v4();

        let this = self.clone();
        let task = tokio::spawn(async move { this.archive_tracked(&app, sync_id).await });

        tracing::info!(%app_id, %sync_id, "Sync dispatched");
        Ok(SyncHandle { sync_id, task })
    }

    /// Snapshot every tracked app now and archive them one after another in
    /// a single background task. A failing app is counted and skipped.
    pub async fn sync_all(&self) -> SyncResult<BatchHandle> {
        let apps = self.registry.list().await?;
        let app_count = apps.len();

        let this = self.clone();
        let task = tokio::spawn(async move { this.run_batch(apps, None).await });

        tracing::info!(app_count, "Batch sync dispatched");
        Ok(BatchHandle { app_count, task })
    }

    /// Like [`sync_one`](Self::sync_one), reporting through the legacy
    /// `progress`/`error`/`done` event stream.
    pub async fn sync_one_events(&self, app_id: AppId) -> SyncResult<ReceiverStream<SyncEvent>> {
        let app = self.registry.get(app_id).await?;
        Ok(self.spawn_evented(vec![app]))
    }

    /// Like [`sync_all`](Self::sync_all), reporting through the legacy
    /// `progress`/`error`/`done` event stream.
    pub async fn sync_all_events(&self) -> SyncResult<ReceiverStream<SyncEvent>> {
        let apps = self.registry.list().await?;
        Ok(self.spawn_evented(apps))
    }

    /// Endless stream of progress-table snapshots: one immediately, then one
    /// per `progress_interval`. Ends only when the consumer drops it.
    pub fn progress_stream(&self) -> impl Stream<Item = ProgressSnapshot> + Send + 'static {
        let table = self.progress.clone();
        let mut interval = tokio::time::interval(self.progress_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        IntervalStream::new(interval).map(move |_| table.snapshot())
    }

    /// Backups of one app with the directory prefix stripped.
    pub async fn list_backups(&self, app_id: AppId) -> SyncResult<Vec<BackupSummary>> {
        self.registry.get(app_id).await?;
        let backups = self.ledger.list_for_app(app_id).await?;
        Ok(backups.iter().map(BackupSummary::from).collect())
    }

    /// Forget all in-flight progress. Called once at process shutdown.
    pub fn shutdown(&self) {
        let in_flight = self.progress.len();
        if in_flight > 0 {
            tracing::warn!(in_flight, "Shutting down with syncs still in flight");
        }
        self.progress.clear();
    }

    fn spawn_evented(&self, apps: Vec<TrackedApp>) -> ReceiverStream<SyncEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let this = self.clone();
        tokio::spawn(async move { this.run_batch(apps, Some(tx)).await });
        ReceiverStream::new(rx)
    }

    /// Archive `apps` sequentially. The batch keeps going when the event
    /// consumer disconnects.
    async fn run_batch(
        &self,
        apps: Vec<TrackedApp>,
        events: Option<mpsc::Sender<SyncEvent>>,
    ) -> SyncReport {
        let amount = apps.len();
        let mut report = SyncReport::default();

        for (position, app) in apps.iter().enumerate() {
            let progress = |status| {
                SyncEvent::Progress(AppProgress {
                    index: position + 1,
                    amount,
                    id: app.id,
                    path: app.path.clone(),
                    status,
                })
            };

            emit(&events, progress(STATUS_STARTING)).await;

            match self.archive_tracked(app, Uuid::new_v4()).await {
                Ok(_) => {
                    report.amount_synced += 1;
                    emit(&events, progress(STATUS_SUCCESS)).await;
                }
                Err(e) => {
                    report.amount_failed += 1;
                    emit(&events, SyncEvent::error(e.kind(), e.message())).await;
                }
            }
        }

        tracing::info!(
            amount_synced = report.amount_synced,
            amount_failed = report.amount_failed,
            "Batch sync finished"
        );
        emit(&events, SyncEvent::done(report)).await;
        report
    }

    /// Drive one archiver run, mirroring each status into the progress
    /// table. The entry disappears when this returns, on every path.
    async fn archive_tracked(&self, app: &TrackedApp, sync_id: SyncId) -> SyncResult<u64> {
        let guard = self.progress.track(sync_id);
        let mut run = self.archiver.run(app, sync_id);
        let mut written = 0;

        while let Some(item) = run.next().await {
            match item {
                Ok(status) => {
                    written = status.current_file_index;
                    guard.update(status);
                }
                Err(e) => {
                    tracing::error!(app_id = %app.id, %sync_id, path = %app.path, error = %e, "Sync failed");
                    return Err(e);
                }
            }
        }

        tracing::info!(app_id = %app.id, %sync_id, files = written, "Sync completed");
        Ok(written)
    }
}

async fn emit(events: &Option<mpsc::Sender<SyncEvent>>, event: SyncEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}
