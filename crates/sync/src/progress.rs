//! In-memory table of in-flight syncs.
//!
//! Writers are the per-sync tasks, readers the snapshot streams. Every
//! operation takes the lock briefly and never across an `.await`, so a
//! plain `std::sync::RwLock` is enough and lets [`ProgressGuard`] clear its
//! entry from `Drop`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use upback_core::sync_events::{ProgressSnapshot, SyncStatus};
use upback_core::types::SyncId;

/// Cheaply cloneable handle to the shared `sync id -> status` map.
#[derive(Clone, Default)]
pub struct ProgressTable {
    inner: Arc<RwLock<HashMap<SyncId, SyncStatus>>>,
}

impl ProgressTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, sync_id: SyncId, status: SyncStatus) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(sync_id, status);
    }

    pub fn remove(&self, sync_id: SyncId) -> Option<SyncStatus> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&sync_id)
    }

    pub fn get(&self, sync_id: SyncId) -> Option<SyncStatus> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&sync_id)
            .cloned()
    }

    /// Copy of the whole table. May lag concurrent writers slightly.
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            current_app_syncs: self
                .inner
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Called on shutdown.
    pub fn clear(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Publish progress for `sync_id` through a guard that removes the entry
    /// when dropped, whatever way the owning task exits.
    pub fn track(&self, sync_id: SyncId) -> ProgressGuard {
        ProgressGuard {
            table: self.clone(),
            sync_id,
        }
    }
}

/// Scoped publisher for one sync's progress entry.
pub struct ProgressGuard {
    table: ProgressTable,
    sync_id: SyncId,
}

impl ProgressGuard {
    pub fn update(&self, status: SyncStatus) {
        self.table.upsert(self.sync_id, status);
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.table.remove(self.sync_id);
    }
}
