//! Error types for the conversation engine surface.

use bazaar_core::error::BazaarError;

/// Errors returned from the engine's public operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a reply is already being prepared for this conversation")]
    Busy,
    #[error("reply discarded: the conversation was reset while replying")]
    Cancelled,
    #[error("storage error: {0}")]
    StorageError(String),
    #[error("catalog error: {0}")]
    CatalogError(String),
}

impl From<BazaarError> for ChatError {
    fn from(err: BazaarError) -> Self {
        match err {
            BazaarError::Catalog(msg) => ChatError::CatalogError(msg),
            other => ChatError::StorageError(other.to_string()),
        }
    }
}
