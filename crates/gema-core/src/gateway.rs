//! Remote Inference Gateway client — one round trip per voice turn.
//!
//! `voice_turn` sends a finalized utterance and gets `{reply text, reply
//! audio}` back in a single response; there is no intermediate streaming, so
//! the caller must wait for the full reply before entering `speaking`.
//! Empty input is rejected locally, before any network call.

use crate::error::{CoreError, CoreResult};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Voices accepted by the speech endpoint (OpenAI set).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

/// Reply to a single-shot voice turn: text plus decoded audio bytes.
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub text: String,
    pub audio: Vec<u8>,
    pub format: String,
}

/// Reply from the speech synthesis endpoint.
#[derive(Debug, Clone)]
pub struct SpeechReply {
    pub audio: Vec<u8>,
    pub format: String,
}

/// The two call shapes the voice core needs from the server.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// One utterance in, `{reply text, reply audio}` out.
    async fn voice_turn(&self, message: &str) -> CoreResult<TurnReply>;

    /// Synthesize speech for arbitrary text.
    async fn generate_speech(&self, text: &str, voice: Option<Voice>) -> CoreResult<SpeechReply>;
}

#[derive(Serialize)]
struct VoiceChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct VoiceChatResponse {
    text: String,
    audio: String,
    format: String,
}

#[derive(Serialize)]
struct GenerateSpeechRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<Voice>,
}

#[derive(Deserialize)]
struct GenerateSpeechResponse {
    audio: String,
    format: String,
}

/// HTTP implementation talking to the Gema gateway.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    /// Base URL without trailing slash (e.g. http://127.0.0.1:3001/api).
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a client for the given gateway base URL. The 60s timeout is the
    /// only bound on a voice turn; expiry surfaces as a transport error and
    /// takes the Turn Controller's self-heal path.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> CoreResult<R> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.client.post(&url).json(body).send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(CoreError::Upstream { status, body });
        }
        Ok(res.json().await?)
    }
}

fn decode_audio(b64: &str) -> CoreResult<Vec<u8>> {
    general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| CoreError::Decode(format!("audio payload: {}", e)))
}

#[async_trait]
impl InferenceGateway for HttpGateway {
    async fn voice_turn(&self, message: &str) -> CoreResult<TurnReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::InvalidArgument("message is empty".into()));
        }
        let res: VoiceChatResponse = self
            .post_json("/voice-agent/chat", &VoiceChatRequest { message })
            .await?;
        Ok(TurnReply {
            text: res.text,
            audio: decode_audio(&res.audio)?,
            format: res.format,
        })
    }

    async fn generate_speech(&self, text: &str, voice: Option<Voice>) -> CoreResult<SpeechReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::InvalidArgument("text is empty".into()));
        }
        let res: GenerateSpeechResponse = self
            .post_json(
                "/voice-agent/generate-speech",
                &GenerateSpeechRequest { text, voice },
            )
            .await?;
        Ok(SpeechReply {
            audio: decode_audio(&res.audio)?,
            format: res.format,
        })
    }
}
