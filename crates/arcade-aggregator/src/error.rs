//! Error types for vote aggregation.

use thiserror::Error;

/// Errors surfaced by the vote aggregator.
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// A vote arrived for a window that has already been finalized.
    #[error("vote for window {window_id} rejected: already finalized (current window is {current_window})")]
    LateVote { window_id: u64, current_window: u64 },
}

/// Result type for aggregator operations.
pub type Result<T> = std::result::Result<T, AggregatorError>;
