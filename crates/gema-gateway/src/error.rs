//! Gateway-side error taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    /// Upstream API answered with a non-success status. No retry.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed upstream response: {0}")]
    Decode(String),
}

impl From<GatewayError> for (StatusCode, String) {
    fn from(err: GatewayError) -> Self {
        (StatusCode::BAD_GATEWAY, err.to_string())
    }
}
