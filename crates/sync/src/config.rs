use std::path::PathBuf;
use std::time::Duration;

/// Default cadence of the progress snapshot stream.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Default cadence of the scheduler's own tick loop.
pub const DEFAULT_SCHEDULER_TICK: Duration = Duration::from_secs(1);

/// Engine configuration.
///
/// | Env Var                 | Default   |
/// |-------------------------|-----------|
/// | `BACKUPS_ROOT`          | `backups` |
/// | `SCHEDULER_TICK_MILLIS` | `1000`    |
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory under which every app gets its own archive folder.
    pub backups_root: PathBuf,
    /// How often `progress_stream` emits a snapshot.
    pub progress_interval: Duration,
    /// How often the cron scheduler checks for due jobs.
    pub scheduler_tick: Duration,
}

impl SyncConfig {
    pub fn new(backups_root: impl Into<PathBuf>) -> Self {
        Self {
            backups_root: backups_root.into(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            scheduler_tick: DEFAULT_SCHEDULER_TICK,
        }
    }

    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let backups_root = std::env::var("BACKUPS_ROOT").unwrap_or_else(|_| "backups".into());

        let scheduler_tick = parse_tick(std::env::var("SCHEDULER_TICK_MILLIS").ok().as_deref());

        Self {
            scheduler_tick,
            ..Self::new(backups_root)
        }
    }
}

/// Parse `SCHEDULER_TICK_MILLIS`. Missing, malformed or zero values fall
/// back to [`DEFAULT_SCHEDULER_TICK`].
fn parse_tick(raw: Option<&str>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_SCHEDULER_TICK;
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            tracing::warn!("SCHEDULER_TICK_MILLIS must be positive, using the default");
            DEFAULT_SCHEDULER_TICK
        }
        Ok(millis) => Duration::from_millis(millis),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Invalid SCHEDULER_TICK_MILLIS, using the default");
            DEFAULT_SCHEDULER_TICK
        }
    }
}
