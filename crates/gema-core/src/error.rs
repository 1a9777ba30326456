//! Error types for the Gema client crates.

use thiserror::Error;

/// Result type alias for client operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by the gateway client and chat transport.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected locally, before any network call (e.g. empty utterance).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The gateway (or its upstream) answered with a non-success status.
    /// Surfaced once to the caller; there is no automatic retry.
    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Malformed response payload (bad base64, unparseable stream frame).
    #[error("decode error: {0}")]
    Decode(String),
}
