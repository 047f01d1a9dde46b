//! Remote authority error types.

use thiserror::Error;

/// Errors from remote guest-authority calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authority returned status {0}")]
    Status(u16),

    #[error("authority rejected the request")]
    Rejected,
}
