/// Domain error shared by every upback crate.
///
/// Variants map one-to-one onto the error taxonomy surfaced to callers:
/// validation and duplicate errors are returned synchronously, a missing
/// source directory only ever shows up asynchronously during a sync.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Source directory missing: {0}")]
    SourceMissing(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] keyed by any displayable id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Taxonomy name used in `"<ErrorKind>: <message>"` event payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NotFoundError",
            CoreError::Validation(_) => "ValidationError",
            CoreError::Duplicate(_) => "DuplicateError",
            CoreError::SourceMissing(_) => "SourceMissingError",
            CoreError::Internal(_) => "InternalError",
        }
    }
}
