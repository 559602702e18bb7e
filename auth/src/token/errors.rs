use thiserror::Error;

/// Error type for token encoding and decoding.
#[derive(Debug, Clone, Error)]
pub enum TokenCodecError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),
}
