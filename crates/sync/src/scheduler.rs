//! Cron scheduler for tracked apps.
//!
//! One job per app with `auto_update = true`, keyed by app id. The job table
//! is rebuilt wholesale by [`CronScheduler::reload`], which callers run after
//! every registry mutation. A background loop started by
//! [`CronScheduler::start`] fires due jobs through a [`SyncTrigger`].
//!
//! Per-job policy ([`JobPolicy`]):
//!
//! - at most one execution of a job in flight; a fire that comes due while
//!   the previous one is still running is skipped,
//! - missed occurrences coalesce: however many fire times passed while the
//!   process was not looking, the job fires once and then waits for the
//!   first occurrence after now.
//!
//! A fire only dispatches the sync; the archive itself runs in the task
//! spawned by the trigger, so a job is "in flight" for a very short time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;
use upback_core::cron::{countdown, Countdown, CronSchedule};
use upback_core::types::{AppId, SyncId};

use crate::coordinator::SyncCoordinator;
use crate::error::SyncResult;
use crate::registry::Registry;

/// Cadence of the next-fire countdown stream.
const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest tick the loop accepts; `tokio::time::interval` rejects zero.
pub const MIN_TICK: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Trigger seam
// ---------------------------------------------------------------------------

/// What a fired job calls. Implemented by [`SyncCoordinator`].
#[async_trait]
pub trait SyncTrigger: Send + Sync {
    /// Dispatch a sync for `app_id` and return without waiting for it.
    async fn trigger(&self, app_id: AppId) -> SyncResult<SyncId>;
}

#[async_trait]
impl SyncTrigger for SyncCoordinator {
    async fn trigger(&self, app_id: AppId) -> SyncResult<SyncId> {
        Ok(self.sync_one(app_id).await?.sync_id)
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Execution policy attached to every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobPolicy {
    pub max_instances: usize,
    pub coalesce: bool,
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self {
            max_instances: 1,
            coalesce: true,
        }
    }
}

struct ScheduledJob {
    app_id: AppId,
    schedule: CronSchedule,
    next_fire: Option<DateTime<Local>>,
    policy: JobPolicy,
    /// Shared with the task of the fire in progress, and carried over when
    /// a reload keeps the job.
    in_flight: Arc<AtomicBool>,
}

/// Read-only view of a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobInfo {
    pub app_id: AppId,
    pub cron: String,
    pub next_fire: Option<DateTime<Local>>,
    pub policy: JobPolicy,
    pub running: bool,
}

impl From<&ScheduledJob> for JobInfo {
    fn from(job: &ScheduledJob) -> Self {
        Self {
            app_id: job.app_id,
            cron: job.schedule.as_str().to_string(),
            next_fire: job.next_fire,
            policy: job.policy,
            running: job.in_flight.load(Ordering::Acquire),
        }
    }
}

// ---------------------------------------------------------------------------
// CronScheduler
// ---------------------------------------------------------------------------

pub struct CronScheduler {
    registry: Registry,
    trigger: Arc<dyn SyncTrigger>,
    jobs: RwLock<HashMap<AppId, ScheduledJob>>,
    tick: Duration,
    reloaded: Notify,
}

impl CronScheduler {
    pub fn new(registry: Registry, trigger: Arc<dyn SyncTrigger>, tick: Duration) -> Self {
        if tick < MIN_TICK {
            tracing::warn!(tick_ms = tick.as_millis() as u64, "Scheduler tick too short, using 1ms");
        }
        let tick = tick.max(MIN_TICK);
        Self {
            registry,
            trigger,
            jobs: RwLock::new(HashMap::new()),
            tick,
            reloaded: Notify::new(),
        }
    }

    /// Rebuild the job table from the registry's current contents.
    ///
    /// Idempotent for an unchanged registry: a job whose cron did not change
    /// keeps its pending fire time. Apps that were disabled or
    /// deleted lose their job; apps whose stored cron no longer parses are
    /// logged and left unscheduled.
    pub async fn reload(&self) -> SyncResult<usize> {
        self.reload_at(Local::now()).await
    }

    /// [`reload`](Self::reload) with an explicit clock.
    pub async fn reload_at(&self, now: DateTime<Local>) -> SyncResult<usize> {
        let apps = self.registry.list().await?;

        let mut jobs = self.jobs.write().await;
        let mut rebuilt = HashMap::with_capacity(apps.len());

        for app in apps.into_iter().filter(|app| app.auto_update) {
            let schedule = match CronSchedule::parse(&app.cron) {
                Ok(schedule) => schedule,
                Err(e) => {
                    tracing::warn!(app_id = %app.id, cron = %app.cron, error = %e, "Skipping job with invalid cron");
                    continue;
                }
            };

            let previous = jobs.get(&app.id);
            let in_flight = previous
                .map(|job| Arc::clone(&job.in_flight))
                .unwrap_or_default();
            // An unchanged schedule keeps its pending fire, even one already due.
            let next_fire = match previous {
                Some(job) if job.schedule.as_str() == schedule.as_str() => job.next_fire,
                _ => schedule.next_after(&now),
            };

            rebuilt.insert(
                app.id,
                ScheduledJob {
                    app_id: app.id,
                    next_fire,
                    schedule,
                    policy: JobPolicy::default(),
                    in_flight,
                },
            );
        }

        *jobs = rebuilt;
        let count = jobs.len();
        drop(jobs);

        self.reloaded.notify_one();
        tracing::info!(jobs = count, "Backup jobs reloaded");
        Ok(count)
    }

    pub async fn jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<JobInfo> = self.jobs.read().await.values().map(JobInfo::from).collect();
        jobs.sort_by_key(|job| job.next_fire);
        jobs
    }

    pub async fn job(&self, app_id: AppId) -> Option<JobInfo> {
        self.jobs.read().await.get(&app_id).map(JobInfo::from)
    }

    /// Fire every job due at `now` and return the ids of the apps fired.
    ///
    /// Each due job fires once no matter how many occurrences it missed, and
    /// its next fire moves to the first occurrence after `now`. A job whose
    /// previous fire is still in flight is skipped and rescheduled the same
    /// way.
    pub async fn run_due(&self, now: DateTime<Local>) -> Vec<AppId> {
        let mut fired = Vec::new();
        let mut jobs = self.jobs.write().await;

        for job in jobs.values_mut() {
            let Some(due) = job.next_fire else { continue };
            if due > now {
                continue;
            }
            job.next_fire = job.schedule.next_after(&now);

            if job.in_flight.swap(true, Ordering::AcqRel) {
                tracing::warn!(app_id = %job.app_id, scheduled_for = %due, "Previous fire still running, skipping");
                continue;
            }

            if now.signed_duration_since(due) > chrono::Duration::from_std(self.tick).unwrap_or_default() {
                tracing::info!(app_id = %job.app_id, scheduled_for = %due, "Coalescing missed fires into one run");
            }

            let trigger = Arc::clone(&self.trigger);
            let in_flight = Arc::clone(&job.in_flight);
            let app_id = job.app_id;
            tokio::spawn(async move {
                match trigger.trigger(app_id).await {
                    Ok(sync_id) => tracing::info!(%app_id, %sync_id, "Scheduled sync fired"),
                    Err(e) => tracing::error!(%app_id, error = %e, "Scheduled sync failed to start"),
                }
                in_flight.store(false, Ordering::Release);
            });

            fired.push(app_id);
        }

        fired
    }

    /// Spawn the tick loop. Runs until `cancel` fires; a reload wakes it
    /// early so a freshly added job that is already due is not delayed.
    pub fn start(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                tick_ms = scheduler.tick.as_millis() as u64,
                "Cron scheduler started"
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Cron scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {}
                    _ = scheduler.reloaded.notified() => {}
                }
                scheduler.run_due(Local::now()).await;
            }
        })
    }
}

/// Countdown to the next fire of `cron`, ticking every second for as long
/// as the consumer keeps the stream.
///
/// Ends immediately when the expression has no future occurrence.
pub fn countdown_stream(schedule: CronSchedule) -> impl Stream<Item = Countdown> + Send + 'static {
    let mut interval = tokio::time::interval(COUNTDOWN_INTERVAL);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    IntervalStream::new(interval)
        .map(move |_| countdown(&schedule, &Local::now()))
        .take_while(|tick| futures::future::ready(tick.is_some()))
        .filter_map(futures::future::ready)
}
