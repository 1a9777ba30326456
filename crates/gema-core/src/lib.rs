//! # Gema Core — shared chat types and gateway clients
//!
//! Everything the voice core and the UI shell share: the chat message model,
//! environment configuration, the Remote Inference Gateway client (single-shot
//! voice turns + speech synthesis), and the streaming Chat Transport.
//!
//! ```text
//! ┌────────────┐   voice_turn / generate_speech   ┌──────────────┐
//! │ gema-voice │ ───────────────────────────────► │ gema-gateway │
//! └────────────┘                                  └──────────────┘
//! ┌────────────┐   stream_chat (SSE deltas)       ┌──────────────┐
//! │  UI shell  │ ───────────────────────────────► │ gema-gateway │
//! └────────────┘                                  └──────────────┘
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod message;
pub mod transport;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use gateway::{HttpGateway, InferenceGateway, SpeechReply, TurnReply, Voice};
pub use message::{new_message_id, ChatMessage, MessagePart, Role};
pub use transport::{ChatTransport, SessionContext, StreamEvent};
