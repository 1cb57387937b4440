//! Errors surfaced by channel operations.

use thiserror::Error;

use crate::store::StoreError;

/// Failures of create, update, verify and resolve.
///
/// Each variant maps to exactly one HTTP status at the boundary
/// (see `http::response`).
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Malformed JSON or missing/invalid fields.
    #[error("{0}")]
    InvalidRequest(String),

    /// The channel id collides with a system route.
    #[error("Channel id is not available")]
    ReservedIdentifier,

    #[error("Channel already exists")]
    AlreadyExists,

    #[error("Channel not found")]
    NotFound,

    /// Wrong password or access key.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// The record store failed or timed out. Never means "absent".
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The stored host/port do not form a valid `Location` header.
    #[error("Invalid redirect target: {0}")]
    InvalidTarget(String),
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
