use thiserror::Error;

/// Error type for credential hashing.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Credential hashing failed: {0}")]
    HashingFailed(String),
}
