//! Upstream model seams and the OpenAI-compatible bridge.
//!
//! `CompletionModel` and `SpeechModel` are the two capabilities the handlers
//! need; `OpenAiBridge` implements both over one reqwest client. Streaming
//! completions arrive as SSE `data:` lines carrying delta chunks, terminated
//! by `[DONE]`; lines are re-assembled across network chunk boundaries before
//! parsing.

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use gema_core::{ChatMessage, CoreConfig, Role, Voice};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// System prompt prepended to every conversation server-side.
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Upper bound on continuation rounds for one streamed response. A round that
/// ends with `finish_reason: "length"` is resumed with the accumulated text
/// appended as an assistant message, up to this many rounds.
pub const MAX_STEPS: usize = 20;

/// Text completion, single-shot or streamed.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// One request, full reply text back.
    async fn complete(&self, system: &str, prompt: &str) -> GatewayResult<String>;

    /// Streamed reply. The receiver yields text deltas in arrival order and
    /// closes after the final one; an `Err` item is terminal.
    async fn stream_complete(
        &self,
        system: &str,
        messages: Vec<ChatMessage>,
    ) -> GatewayResult<mpsc::Receiver<GatewayResult<String>>>;
}

/// Text-to-speech synthesis.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Synthesize `text` as mp3 bytes.
    async fn synthesize(&self, text: &str, voice: Voice) -> GatewayResult<Vec<u8>>;
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

fn wire_message(msg: &ChatMessage) -> WireMessage {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };
    WireMessage {
        role: role.to_string(),
        content: msg.text(),
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: Voice,
    response_format: &'a str,
}

enum RoundEnd {
    Complete,
    Truncated,
}

/// OpenAI-compatible upstream client.
#[derive(Clone)]
pub struct OpenAiBridge {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    stream_model: String,
    tts_model: String,
}

impl OpenAiBridge {
    /// Build from config. Fails fast when no API key is configured.
    pub fn from_config(config: &CoreConfig) -> GatewayResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(GatewayError::MissingApiKey)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: config.openai_api_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: config.chat_model.clone(),
            stream_model: config.stream_model.clone(),
            tts_model: config.tts_model.clone(),
        })
    }

    async fn check(res: reqwest::Response) -> GatewayResult<reqwest::Response> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(GatewayError::Upstream { status, body })
    }

    /// One streamed round against `/chat/completions`. Deltas go to `tx` and
    /// accumulate into `acc` for a possible continuation round.
    async fn stream_round(
        &self,
        messages: &[WireMessage],
        tx: &mpsc::Sender<GatewayResult<String>>,
        acc: &mut String,
    ) -> GatewayResult<RoundEnd> {
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &self.stream_model,
                messages,
                stream: true,
            })
            .send()
            .await?;
        let res = Self::check(res).await?;

        let mut stream = res.bytes_stream();
        let mut pending = String::new();
        let mut truncated = false;
        while let Some(chunk) = stream.next().await {
            pending.push_str(&String::from_utf8_lossy(&chunk?));
            while let Some(pos) = pending.find('\n') {
                let line: String = pending.drain(..=pos).collect();
                let Some(data) = line.trim().strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    return Ok(if truncated {
                        RoundEnd::Truncated
                    } else {
                        RoundEnd::Complete
                    });
                }
                let parsed: StreamChunk = match serde_json::from_str(data) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("unparseable stream chunk ({}): {}", e, data);
                        continue;
                    }
                };
                if let Some(choice) = parsed.choices.into_iter().next() {
                    if let Some(content) = choice.delta.content {
                        if !content.is_empty() {
                            acc.push_str(&content);
                            if tx.send(Ok(content)).await.is_err() {
                                // Receiver gone; drop the rest.
                                return Ok(RoundEnd::Complete);
                            }
                        }
                    }
                    if choice.finish_reason.as_deref() == Some("length") {
                        truncated = true;
                    }
                }
            }
        }
        Ok(if truncated {
            RoundEnd::Truncated
        } else {
            RoundEnd::Complete
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAiBridge {
    async fn complete(&self, system: &str, prompt: &str) -> GatewayResult<String> {
        let messages = [
            WireMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            WireMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ];
        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &self.chat_model,
                messages: &messages,
                stream: false,
            })
            .send()
            .await?;
        let res: CompletionResponse = Self::check(res).await?.json().await?;
        res.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::Decode("completion carried no choices".into()))
    }

    async fn stream_complete(
        &self,
        system: &str,
        messages: Vec<ChatMessage>,
    ) -> GatewayResult<mpsc::Receiver<GatewayResult<String>>> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
        wire.extend(messages.iter().map(wire_message));

        let (tx, rx) = mpsc::channel(32);
        let bridge = self.clone();
        tokio::spawn(async move {
            let mut wire = wire;
            for step in 0..MAX_STEPS {
                let mut acc = String::new();
                match bridge.stream_round(&wire, &tx, &mut acc).await {
                    Ok(RoundEnd::Complete) => return,
                    Ok(RoundEnd::Truncated) => {
                        debug!(step, "response truncated on length, continuing");
                        wire.push(WireMessage {
                            role: "assistant".to_string(),
                            content: acc,
                        });
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
            warn!("stream ended after exhausting {} rounds", MAX_STEPS);
        });
        Ok(rx)
    }
}

#[async_trait]
impl SpeechModel for OpenAiBridge {
    async fn synthesize(&self, text: &str, voice: Voice) -> GatewayResult<Vec<u8>> {
        let res = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model: &self.tts_model,
                input: text,
                voice,
                response_format: "mp3",
            })
            .send()
            .await?;
        Ok(Self::check(res).await?.bytes().await?.to_vec())
    }
}
