//! Error types for the relay

use thiserror::Error;

/// Relay error types
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Room is full (maximum {0} users)")]
    RoomFull(usize),

    #[error("Server at capacity ({0} connections)")]
    ServerFull(usize),

    #[error("Not joined to a room")]
    NotJoined,

    #[error("Invalid sync action: {0}")]
    InvalidAction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
