use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use upback_sync::{CronScheduler, Engine, Ledger, Registry, SyncCoordinator};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: upback_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    pub registry: Registry,
    pub ledger: Ledger,
    /// Dispatches syncs and owns the progress table.
    pub coordinator: Arc<SyncCoordinator>,
    /// Must be reloaded after every registry mutation.
    pub scheduler: Arc<CronScheduler>,
    /// Cancelled once on process shutdown. Stops the scheduler loop and ends
    /// open SSE streams so graceful shutdown can complete.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(pool: upback_db::DbPool, config: ServerConfig) -> Self {
        let engine = Engine::new(pool.clone(), &config.sync);
        Self {
            pool,
            config: Arc::new(config),
            registry: engine.registry,
            ledger: engine.ledger,
            coordinator: engine.coordinator,
            scheduler: engine.scheduler,
            shutdown: CancellationToken::new(),
        }
    }

    /// Rebuild the scheduler's job table after a registry change.
    ///
    /// The mutation has already been committed, so a failed reload is logged
    /// rather than reported to the caller; the next successful reload
    /// catches up.
    pub async fn reload_schedule(&self) {
        if let Err(e) = self.scheduler.reload().await {
            tracing::error!(error = %e, "Failed to reload backup jobs");
        }
    }
}
