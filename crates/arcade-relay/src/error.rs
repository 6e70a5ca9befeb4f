//! Relay errors and their HTTP mapping (§4.6 error table).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors the relay can return to a caller.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing field, out-of-range action, or malformed request body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The client-supplied signature didn't recover to `userAddress`, or
    /// was rejected chain-side.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// `deadline` is in the past.
    #[error("deadline expired")]
    DeadlineExpired,

    /// First submission for an undelegated user with no authorization list.
    #[error("user is not delegated and no authorization was supplied")]
    MissingAuthorization,

    /// The relay wallet doesn't have enough balance to submit.
    #[error("relay wallet underfunded")]
    WalletUnderfunded,

    /// A locally-tracked nonce no longer matches what the relay expects.
    #[error("local nonce conflict")]
    NonceConflict,

    /// Any other chain or RPC failure.
    #[error("relay submission failed: {0}")]
    Chain(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match &self {
            RelayError::BadRequest(_)
            | RelayError::InvalidSignature(_)
            | RelayError::DeadlineExpired
            | RelayError::MissingAuthorization => StatusCode::BAD_REQUEST,
            RelayError::WalletUnderfunded => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::NonceConflict => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Chain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::warn!(error = %self, status = %status.as_u16(), "relay request failed");

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
