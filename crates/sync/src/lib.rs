//! The upback sync engine.
//!
//! Registry and ledger front the database; the archiver writes one zip per
//! run; the coordinator dispatches runs and tracks their progress; the cron
//! scheduler fires runs for apps with `auto_update` enabled.
//!
//! [`Engine`] wires all of these together over a single pool.

use std::sync::Arc;

use upback_db::DbPool;

pub mod archiver;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod progress;
pub mod registry;
pub mod scheduler;

pub use config::SyncConfig;
pub use coordinator::SyncCoordinator;
pub use error::{SyncError, SyncResult};
pub use ledger::Ledger;
pub use registry::Registry;
pub use scheduler::CronScheduler;

/// Every long-lived engine component, built once at startup.
#[derive(Clone)]
pub struct Engine {
    pub registry: Registry,
    pub ledger: Ledger,
    pub coordinator: Arc<SyncCoordinator>,
    pub scheduler: Arc<CronScheduler>,
}

impl Engine {
    /// Build the engine. The scheduler starts with no jobs; call
    /// [`CronScheduler::reload`] and [`CronScheduler::start`] to run it.
    pub fn new(pool: DbPool, config: &SyncConfig) -> Self {
        let registry = Registry::new(pool.clone());
        let ledger = Ledger::new(pool);
        let coordinator = Arc::new(SyncCoordinator::new(
            registry.clone(),
            ledger.clone(),
            config,
        ));
        let scheduler = Arc::new(CronScheduler::new(
            registry.clone(),
            coordinator.clone(),
            config.scheduler_tick,
        ));
        Self {
            registry,
            ledger,
            coordinator,
            scheduler,
        }
    }
}
