//! Error types for chain ingestion.

use thiserror::Error;

/// Errors surfaced by the chain client.
///
/// Per policy (spec §7), none of these are fatal to the process — the
/// supervisor logs them and the owning task retries on its own timer.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The subscription transport dropped or failed to connect.
    #[error("subscription upstream error: {0}")]
    Subscription(String),

    /// The polling HTTP upstream returned an error or timed out.
    #[error("poll upstream error: {0}")]
    Poll(String),

    /// A log or block payload failed to parse into our data model.
    #[error("failed to parse upstream payload: {0}")]
    Parse(String),

    /// An RPC call exceeded its configured timeout.
    #[error("rpc call timed out")]
    Timeout,
}

/// Result type for chain-client operations.
pub type Result<T> = std::result::Result<T, ChainError>;
