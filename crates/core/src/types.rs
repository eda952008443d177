//! Shared primitive aliases.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier of a tracked app.
pub type AppId = Uuid;

/// Identifier of one sync run. Doubles as the id of its backup record.
pub type SyncId = Uuid;

/// Wall-clock timestamp, always UTC at rest.
pub type Timestamp = DateTime<Utc>;
