//! Error types for frame compression.

use thiserror::Error;

/// Errors surfaced by the frame pipeline. Per §7, a compression error
/// drops that one frame and is otherwise non-fatal.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raw buffer's length didn't match `width * height * 4`.
    #[error("raw frame has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BadDimensions {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// The underlying image codec failed to encode the frame.
    #[error("jpeg encode failed: {0}")]
    Encode(String),
}

/// Result type for frame-pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
