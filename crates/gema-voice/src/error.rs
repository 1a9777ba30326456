//! Error types for the voice interaction.

use thiserror::Error;

/// Result type alias for voice operations.
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can occur during a voice interaction.
#[derive(Error, Debug)]
pub enum VoiceError {
    /// Microphone access refused. Fatal to the interaction: the caller must
    /// notify the user and close.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// Platform speech recognition failed. Transient/simulator noise is
    /// absorbed before this is raised; see `recognizer::is_transient_recognizer_error`.
    #[error("recognizer error: {0}")]
    Recognizer(String),

    /// Empty user input, rejected before any network call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Model or speech-synthesis call failed. Non-fatal: the session
    /// self-heals back to listening.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("playback error: {0}")]
    Playback(String),

    /// Error while stopping or destroying the recognizer/player during close.
    /// Logged, never re-thrown, never blocks teardown.
    #[error("cleanup error: {0}")]
    Cleanup(String),

    #[error("channel send error: {0}")]
    ChannelSend(String),
}

impl From<gema_core::CoreError> for VoiceError {
    fn from(err: gema_core::CoreError) -> Self {
        match err {
            gema_core::CoreError::InvalidArgument(m) => VoiceError::InvalidArgument(m),
            other => VoiceError::Upstream(other.to_string()),
        }
    }
}
