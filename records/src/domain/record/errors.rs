use thiserror::Error;
use uuid::Uuid;

use crate::domain::record::models::FieldErrors;
use crate::domain::record::models::VersionToken;

/// Opaque passthrough for persistence-layer failures. Always surfaced to the
/// caller, never swallowed or retried.
#[derive(Debug, Clone, Error)]
#[error("Storage error: {0}")]
pub struct StorageError(pub String);

/// Top-level error for record operations.
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    /// Field-level validation failures; the map carries one message per
    /// offending field. User-correctable.
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// The caller's version no longer matches the stored record. The caller
    /// must re-fetch and reapply; nothing is retried here.
    #[error("Version conflict: supplied {supplied}, stored {current}")]
    VersionConflict {
        supplied: VersionToken,
        current: VersionToken,
    },

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
