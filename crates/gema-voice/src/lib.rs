//! # Gema Voice — turn-taking orchestration for the voice interaction
//!
//! Coordinates an external speech recognizer, silence-based end-of-turn
//! detection, the remote inference gateway, and audio playback into one
//! `idle → listening → processing → speaking → listening` cycle.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Turn Controller                         │
//! │  ┌────────────┐   ┌────────────┐   ┌───────────────────┐    │
//! │  │ Recognizer │ → │ Transcript │ → │ Silence Detector  │    │
//! │  │ (external) │   │   Buffer   │   │  (2000ms debounce)│    │
//! │  └────────────┘   └────────────┘   └───────────────────┘    │
//! │         ↑                                     ↓              │
//! │  ┌────────────┐   finished signal   ┌──────────────────┐    │
//! │  │  Playback  │ ←─────────────────  │ Inference Gateway│    │
//! │  │  (rodio)   │                     │  (one in flight) │    │
//! │  └────────────┘                     └──────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller is single-threaded cooperative: one `run()` loop, at most
//! one pending debounce timer, at most one in-flight inference call.

pub mod agent;
pub mod error;
pub mod playback;
pub mod recognizer;
pub mod silence;
pub mod transcript;
pub mod turn;

pub use agent::{
    dispatch, AgentEvent, AgentMode, ConversationClient, ConversationState, ConversationStatus,
    MessageSource,
};
pub use error::{VoiceError, VoiceResult};
pub use playback::{AudioPlayer, RodioPlayer};
pub use recognizer::{is_transient_recognizer_error, RecognizerEvent, SpeechRecognizer};
pub use silence::{evaluate, SilenceAction, DEFAULT_DEBOUNCE_WINDOW};
pub use transcript::TranscriptBuffer;
pub use turn::{TurnConfig, TurnController, TurnEvent, TurnHandle, TurnSession, TurnStatus};
