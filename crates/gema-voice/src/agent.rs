//! Managed voice-agent connection — full-duplex audio with server-side turn
//! detection, supplied by an external realtime service.
//!
//! The provider SDK surfaces a pile of named callbacks; here they arrive as
//! one tagged event stream, folded by a single dispatcher so the whole
//! transition table lives in [`ConversationState::apply`].

use crate::error::VoiceResult;
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStatus {
    Connecting,
    Connected,
    Disconnected,
}

/// Who holds the floor, as reported by the provider's turn detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    Speaking,
    Listening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    User,
    Agent,
}

/// Everything the provider reports, as one stream.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Connected { conversation_id: String },
    Disconnected,
    StatusChanged(ConversationStatus),
    ModeChanged(AgentMode),
    MessageReceived { source: MessageSource, message: String },
    /// Voice-activity score in `[0, 1]`.
    VadScore(f32),
    /// Whether feedback may currently be submitted for the last reply.
    Feedbackable(bool),
    Error(String),
}

/// The realtime conversation session. Opaque collaborator: connecting,
/// transport, and turn detection all happen on the provider's side.
#[async_trait]
pub trait ConversationClient: Send {
    /// Open a session for the given agent, attributed to the given user.
    async fn connect(&mut self, agent_id: &str, user_id: &str) -> VoiceResult<()>;

    async fn disconnect(&mut self) -> VoiceResult<()>;

    fn set_mic_muted(&mut self, muted: bool);

    /// Send a typed user message into the live conversation.
    async fn send_user_message(&mut self, text: &str) -> VoiceResult<()>;

    /// Push non-conversational context (screen contents, app state).
    async fn send_contextual_update(&mut self, text: &str) -> VoiceResult<()>;

    /// Signal that the user is active, resetting the provider's idle timer.
    async fn send_user_activity(&mut self) -> VoiceResult<()>;

    /// Thumbs up/down for the most recent agent reply.
    async fn send_feedback(&mut self, positive: bool) -> VoiceResult<()>;

    /// Take the event receiver. Yields `None` on second call.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<AgentEvent>>;
}

/// Observable session state, produced only by [`ConversationState::apply`].
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub status: ConversationStatus,
    pub mode: AgentMode,
    pub conversation_id: Option<String>,
    pub can_send_feedback: bool,
    pub last_vad_score: Option<f32>,
    pub messages: Vec<(MessageSource, String)>,
    pub last_error: Option<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            status: ConversationStatus::Connecting,
            mode: AgentMode::Listening,
            conversation_id: None,
            can_send_feedback: false,
            last_vad_score: None,
            messages: Vec::new(),
            last_error: None,
        }
    }
}

impl ConversationState {
    /// Fold one provider event into the state.
    pub fn apply(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::Connected { conversation_id } => {
                debug!(%conversation_id, "conversation connected");
                self.conversation_id = Some(conversation_id);
                self.status = ConversationStatus::Connected;
            }
            AgentEvent::Disconnected => {
                self.status = ConversationStatus::Disconnected;
                self.mode = AgentMode::Listening;
                self.can_send_feedback = false;
                self.last_vad_score = None;
            }
            AgentEvent::StatusChanged(status) => {
                self.status = status;
                if status == ConversationStatus::Disconnected {
                    self.conversation_id = None;
                }
            }
            AgentEvent::ModeChanged(mode) => self.mode = mode,
            AgentEvent::MessageReceived { source, message } => {
                self.messages.push((source, message));
            }
            AgentEvent::VadScore(score) => self.last_vad_score = Some(score),
            AgentEvent::Feedbackable(allowed) => self.can_send_feedback = allowed,
            AgentEvent::Error(message) => self.last_error = Some(message),
        }
    }
}

/// Drive the event stream to completion, publishing each folded state over a
/// watch channel for the UI shell. Returns when the provider closes the
/// stream.
pub async fn dispatch(
    mut events: mpsc::UnboundedReceiver<AgentEvent>,
    state_tx: watch::Sender<ConversationState>,
) {
    let mut state = ConversationState::default();
    while let Some(event) = events.recv().await {
        state.apply(event);
        if state_tx.send(state.clone()).is_err() {
            // Every observer is gone; keep folding is pointless.
            return;
        }
    }
}
