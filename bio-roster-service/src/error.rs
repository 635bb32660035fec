//! Error taxonomy for the roster service.

use thiserror::Error;

/// Bad input; raised before any store call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("biography is {length} characters long, the limit is {max}")]
    BiographyTooLong { length: usize, max: usize },
}

/// Listing/query failure. The cache keeps its previous contents.
#[derive(Debug, Error)]
pub enum StoreReadError {
    #[error("Notion request failed: {0}")]
    Transport(String),
    #[error("Notion API error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("Invalid response from Notion: {0}")]
    Decode(String),
}

/// Create/update failure.
#[derive(Debug, Error)]
pub enum StoreWriteError {
    #[error("Notion request failed: {0}")]
    Transport(String),
    #[error("Notion rejected the write ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid response from Notion: {0}")]
    Decode(String),
}

/// Failed outcome of a biography submission.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Write(#[from] StoreWriteError),
    #[error("the biography update for member {member_id} was not accepted")]
    UpdateRejected { member_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),
    #[error("{key} has an invalid value '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}
