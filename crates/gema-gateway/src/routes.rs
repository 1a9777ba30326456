//! HTTP surface: three `/api` endpoints plus health, built as a `Router`
//! factory so tests can drive it with `tower::ServiceExt::oneshot`.

use crate::error::GatewayError;
use crate::openai::{CompletionModel, SpeechModel, SYSTEM_PROMPT};
use async_stream::stream;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine};
use futures_util::Stream;
use gema_core::{new_message_id, ChatMessage, CoreConfig, StreamEvent, Voice};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// What clients see when an upstream error is masked.
const MASKED_ERROR: &str = "An error occurred while processing your message";

#[derive(Clone)]
pub struct AppState {
    pub completion: Arc<dyn CompletionModel>,
    pub speech: Arc<dyn SpeechModel>,
    pub config: Arc<CoreConfig>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/voice-agent/chat", post(voice_chat))
        .route("/api/voice-agent/generate-speech", post(generate_speech))
        .route("/api/text-agent/", post(text_agent))
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Deserialize)]
struct VoiceChatRequest {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct VoiceChatResponse {
    text: String,
    audio: String,
    format: &'static str,
}

/// POST /api/voice-agent/chat — one voice turn: complete, then synthesize the
/// reply with the default voice.
async fn voice_chat(
    State(state): State<AppState>,
    Json(req): Json<VoiceChatRequest>,
) -> Result<Json<VoiceChatResponse>, (StatusCode, String)> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message is required".to_string()));
    }
    let text = state.completion.complete(SYSTEM_PROMPT, message).await?;
    let audio = state.speech.synthesize(&text, Voice::Alloy).await?;
    Ok(Json(VoiceChatResponse {
        text,
        audio: general_purpose::STANDARD.encode(audio),
        format: "mp3",
    }))
}

#[derive(Deserialize)]
struct GenerateSpeechRequest {
    #[serde(default)]
    text: String,
    /// Unknown voice names are rejected by the extractor (422).
    #[serde(default)]
    voice: Option<Voice>,
}

#[derive(Serialize)]
struct GenerateSpeechResponse {
    audio: String,
    format: &'static str,
}

/// POST /api/voice-agent/generate-speech — standalone synthesis.
async fn generate_speech(
    State(state): State<AppState>,
    Json(req): Json<GenerateSpeechRequest>,
) -> Result<Json<GenerateSpeechResponse>, (StatusCode, String)> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Text is required".to_string()));
    }
    let voice = req.voice.unwrap_or_default();
    let audio = state.speech.synthesize(text, voice).await?;
    Ok(Json(GenerateSpeechResponse {
        audio: general_purpose::STANDARD.encode(audio),
        format: "mp3",
    }))
}

#[derive(Deserialize)]
struct TextAgentRequest {
    messages: Vec<ChatMessage>,
    #[serde(rename = "patientId", default)]
    patient_id: Option<String>,
    #[serde(rename = "clinicId", default)]
    clinic_id: Option<String>,
}

fn frame(event: &StreamEvent) -> Event {
    Event::default().data(serde_json::to_string(event).unwrap_or_default())
}

fn mask(err: &GatewayError, unmask: bool) -> String {
    if unmask {
        err.to_string()
    } else {
        MASKED_ERROR.to_string()
    }
}

/// POST /api/text-agent/ — streamed chat. Frames are JSON [`StreamEvent`]s on
/// `data:` lines, terminated by `data: [DONE]`. Upstream failures surface as
/// one masked `error` frame unless `GEMA_UNMASK_ERRORS` is set.
async fn text_agent(
    State(state): State<AppState>,
    Json(req): Json<TextAgentRequest>,
) -> Sse<Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send + 'static>>> {
    debug!(
        messages = req.messages.len(),
        patient = ?req.patient_id,
        clinic = ?req.clinic_id,
        "text agent request"
    );
    let unmask = state.config.unmask_errors;
    let completion = Arc::clone(&state.completion);
    let messages = req.messages;

    let stream = stream! {
        let id = new_message_id();
        match completion.stream_complete(SYSTEM_PROMPT, messages).await {
            Ok(mut deltas) => {
                yield Ok(frame(&StreamEvent::Start { id: id.clone() }));
                while let Some(item) = deltas.recv().await {
                    match item {
                        Ok(delta) => {
                            yield Ok(frame(&StreamEvent::TextDelta { id: id.clone(), delta }));
                        }
                        Err(e) => {
                            error!("text agent stream failed: {}", e);
                            yield Ok(frame(&StreamEvent::Error { message: mask(&e, unmask) }));
                            yield Ok(Event::default().data("[DONE]"));
                            return;
                        }
                    }
                }
                yield Ok(frame(&StreamEvent::Finish));
                yield Ok(Event::default().data("[DONE]"));
            }
            Err(e) => {
                error!("text agent request failed: {}", e);
                yield Ok(frame(&StreamEvent::Error { message: mask(&e, unmask) }));
                yield Ok(Event::default().data("[DONE]"));
            }
        }
    };

    let stream: Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send + 'static>> =
        Box::pin(stream);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
