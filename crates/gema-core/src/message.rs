//! Chat message model shared between the UI shell, transport, and gateway.
//!
//! Messages are append-only from the UI's perspective; the server never
//! mutates history it did not just produce.

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One content part of a message. Tagged so new part kinds (images, tool
/// output) can be added without breaking the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text { text: String },
}

/// A single chat message: opaque id, author role, ordered content parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    /// Build a single-part text message with a fresh id.
    pub fn text_message(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role,
            parts: vec![MessagePart::Text { text: text.into() }],
        }
    }

    /// Concatenated text content, in part order.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| match p {
                MessagePart::Text { text } => text.as_str(),
            })
            .collect()
    }
}

/// Mint an opaque message id (uuid v4).
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
