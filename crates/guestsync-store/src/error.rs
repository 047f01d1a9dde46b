//! Store error types.

use thiserror::Error;

/// Errors from snapshot persistence operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store path has no parent directory")]
    NoParentDir,
}
