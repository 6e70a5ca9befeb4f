//! Error types for the fan-out hub.

use thiserror::Error;

/// Errors that can occur in hub operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Client not found.
    #[error("client not found: {0}")]
    ClientNotFound(String),

    /// Send failed.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,

    /// The hub's connection cap was reached.
    #[error("maximum spectator connections reached")]
    ConnectionLimitReached,
}

/// Result type for hub operations.
pub type Result<T> = std::result::Result<T, RealtimeError>;
