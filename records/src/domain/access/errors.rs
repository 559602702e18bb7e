use thiserror::Error;

use crate::domain::record::errors::StorageError;

/// Authentication failures, kept as distinct categories so callers can react
/// differently: expired and stale-credential tokens should prompt re-login,
/// a malformed token must never be retried.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token was issued before the subject's credentials last changed")]
    StaleCredentials,

    #[error("Token subject no longer exists")]
    SubjectNotFound,

    #[error("No authenticated principal in the current request")]
    NoPrincipal,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Account is blocked from logging in")]
    AccountLocked,

    #[error("Failed to create token: {0}")]
    TokenCreation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
