//! Store error types

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by [`super::ContentStore`] implementations.
///
/// Persist failures are user-visible but non-fatal: editing continues and
/// the next explicit save retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("project not found: {id}")]
    ProjectNotFound { id: Uuid },

    #[error("log entry not found: {id}")]
    LogNotFound { id: Uuid },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
