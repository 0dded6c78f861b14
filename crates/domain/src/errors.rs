//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Roost
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum RoostError {
    #[error("Calendar feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Listing not found: {0}")]
    ListingNotFound(String),

    #[error("Calendar sync failed: {0}")]
    SyncFailed(String),

    #[error("Sync already in progress: {0}")]
    SyncInProgress(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Roost operations
pub type Result<T> = std::result::Result<T, RoostError>;
