use upback_core::error::CoreError;

/// Error type for every operation of the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A domain-level error from `upback_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A registry or ledger read/write failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A blocking archive task panicked or was cancelled.
    #[error("Task failed: {0}")]
    TaskJoin(String),
}

impl SyncError {
    /// Taxonomy name used in `"<ErrorKind>: <message>"` event payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Core(core) => core.kind(),
            SyncError::Persistence(_) => "PersistenceError",
            SyncError::Io(_) => "IoError",
            SyncError::Archive(_) => "ArchiveError",
            SyncError::TaskJoin(_) => "InternalError",
        }
    }

    /// Message without the taxonomy prefix.
    pub fn message(&self) -> String {
        match self {
            SyncError::Core(CoreError::NotFound { entity, id }) => {
                format!("{entity} with id {id} not found")
            }
            SyncError::Core(CoreError::Validation(msg))
            | SyncError::Core(CoreError::Duplicate(msg))
            | SyncError::Core(CoreError::SourceMissing(msg))
            | SyncError::Core(CoreError::Internal(msg))
            | SyncError::TaskJoin(msg) => msg.clone(),
            SyncError::Persistence(e) => e.to_string(),
            SyncError::Io(e) => e.to_string(),
            SyncError::Archive(e) => e.to_string(),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
