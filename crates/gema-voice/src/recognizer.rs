//! Speech recognizer seam — the external STT engine the platform provides.
//!
//! Recognition itself is delegated; this module defines the event surface the
//! Turn Controller consumes and the transient-error classification that keeps
//! simulator noise from surfacing as user-visible failures.

use crate::error::VoiceResult;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Events emitted by the platform recognizer.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// Recognition started (microphone open).
    Started,
    /// Updated partial hypotheses, best first. High frequency.
    PartialResults(Vec<String>),
    /// Finalized results, best first.
    Results(Vec<String>),
    /// Recognition ended on the platform side.
    End,
    /// Platform error. May be transient noise; see
    /// [`is_transient_recognizer_error`].
    Error { code: String, message: String },
}

/// The external speech-to-text engine. The microphone is singly-owned by the
/// active session: `destroy` must complete before another instance may start.
#[async_trait(?Send)]
pub trait SpeechRecognizer {
    /// Request microphone permission. `PermissionDenied` terminates the
    /// interaction.
    async fn request_permission(&mut self) -> VoiceResult<()>;

    /// Start continuous recognition.
    async fn start(&mut self) -> VoiceResult<()>;

    /// Stop recognition, keeping the recognizer instance alive.
    async fn stop(&mut self) -> VoiceResult<()>;

    /// Release the recognizer and the microphone handle.
    async fn destroy(&mut self) -> VoiceResult<()>;

    /// Take the event receiver. Yields `None` on second call.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<RecognizerEvent>>;
}

/// Whether a platform recognizer error is transient/simulator-only noise that
/// should be absorbed silently rather than surfaced.
pub fn is_transient_recognizer_error(code: &str, message: &str) -> bool {
    matches!(code, "203" | "1110" | "recognition_fail" | "start_recording")
        || message.contains("Timeout")
        || message.contains("No speech detected")
        || message.contains("sampleRate")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_codes_are_absorbed() {
        for code in ["203", "1110", "recognition_fail", "start_recording"] {
            assert!(is_transient_recognizer_error(code, ""), "code {}", code);
        }
    }

    #[test]
    fn transient_messages_are_absorbed() {
        assert!(is_transient_recognizer_error("7", "Timeout waiting for speech"));
        assert!(is_transient_recognizer_error("7", "No speech detected"));
        assert!(is_transient_recognizer_error("7", "invalid sampleRate for device"));
    }

    #[test]
    fn real_errors_surface() {
        assert!(!is_transient_recognizer_error("9", "insufficient permissions"));
        assert!(!is_transient_recognizer_error("5", "client side error"));
    }
}
