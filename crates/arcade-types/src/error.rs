//! Error types for the core data model.

use thiserror::Error;

/// Errors that can occur while constructing or parsing core types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// A raw action code was outside the 0..7 range.
    #[error("invalid action code: {0}")]
    InvalidAction(u8),

    /// A hex string did not decode to the expected byte length.
    #[error("invalid hex value for {field}: expected {expected} bytes, got {actual}")]
    InvalidHexLength {
        /// The field being decoded.
        field: &'static str,
        /// Expected byte length.
        expected: usize,
        /// Actual decoded length.
        actual: usize,
    },

    /// A hex string failed to decode.
    #[error("malformed hex for {field}: {source}")]
    MalformedHex {
        /// The field being decoded.
        field: &'static str,
        /// Underlying decode error.
        #[source]
        source: hex::FromHexError,
    },
}

/// Result type for core data model operations.
pub type Result<T> = std::result::Result<T, TypesError>;
