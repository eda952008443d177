//! Progress records and streaming event envelopes for sync runs.
//!
//! Every streamed record serializes as `{ "type": ..., "payload": ... }`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{AppId, SyncId};

/// Per-app progress status emitted before an archive starts.
pub const STATUS_STARTING: &str = "starting";

/// Per-app progress status emitted after an archive completes.
pub const STATUS_SUCCESS: &str = "success";

/// Status carried by the final `done` event of a batch.
pub const STATUS_FINISHED: &str = "finished";

/// `type` of every record on the live polling and countdown streams.
pub const EVENT_PROGRESS: &str = "progress";

/// Live state of one in-flight sync. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub app_id: AppId,
    /// 1-based index of the file just written.
    pub current_file_index: u64,
    pub total_files: u64,
    pub current_file_path: String,
}

/// Payload of the live polling stream. Empty mapping when idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub current_app_syncs: HashMap<SyncId, SyncStatus>,
}

/// Per-app progress within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppProgress {
    /// 1-based position of the app in the batch.
    pub index: usize,
    /// Number of apps in the batch.
    pub amount: usize,
    pub id: AppId,
    pub path: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    /// `"<ErrorKind>: <message>"`
    pub status: String,
}

/// Final tally of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub amount_synced: usize,
    pub amount_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonePayload {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: SyncReport,
}

/// One record on the legacy streaming path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum SyncEvent {
    Progress(AppProgress),
    Error(ErrorPayload),
    Done(DonePayload),
}

/// `{type, payload}` record for the live polling and countdown streams,
/// whose payloads are not [`SyncEvent`] variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEvent<T> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub payload: T,
}

impl<T> StreamEvent<T> {
    pub fn progress(payload: T) -> Self {
        Self {
            kind: EVENT_PROGRESS,
            payload,
        }
    }
}

impl SyncEvent {
    pub fn error(kind: &str, message: impl std::fmt::Display) -> Self {
        SyncEvent::Error(ErrorPayload {
            status: format!("{kind}: {message}"),
        })
    }

    pub fn done(report: SyncReport) -> Self {
        SyncEvent::Done(DonePayload {
            status: STATUS_FINISHED,
            report,
        })
    }
}
