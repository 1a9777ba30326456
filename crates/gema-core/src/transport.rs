//! Chat Transport — streams incremental assistant deltas from the gateway.
//!
//! One POST to `/text-agent/` opens a long-lived SSE response; each `data:`
//! line carries a JSON [`StreamEvent`], terminated by `data: [DONE]`. Frames
//! are re-assembled across chunk boundaries so deltas concatenate to exactly
//! the server-produced string (no truncation, no duplication).

use crate::error::{CoreError, CoreResult};
use crate::message::ChatMessage;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Explicit session context threaded through the UI shell and transport.
/// Replaces the original's ambient global store.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub chat_id: String,
    pub patient_id: Option<String>,
    pub clinic_id: Option<String>,
}

/// One frame of the text-agent stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    /// Stream opened; an assistant message with `id` is being produced.
    Start { id: String },
    /// Incremental text for the message `id`, in arrival order.
    TextDelta { id: String, delta: String },
    /// The assistant message is complete.
    Finish,
    /// Terminal error; no more frames follow.
    Error { message: String },
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    #[serde(rename = "patientId", skip_serializing_if = "Option::is_none")]
    patient_id: Option<&'a str>,
    #[serde(rename = "clinicId", skip_serializing_if = "Option::is_none")]
    clinic_id: Option<&'a str>,
}

/// Accumulates raw bytes and yields complete `data:` payloads. SSE chunks can
/// split a frame anywhere, so a partial trailing line stays buffered.
#[derive(Debug, Default)]
struct SseLineBuffer {
    pending: String,
}

impl SseLineBuffer {
    fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));
        let mut out = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(data) = line.strip_prefix("data: ") {
                out.push(data.to_string());
            }
        }
        out
    }
}

/// Client for the streaming chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatTransport {
    base_url: String,
    client: reqwest::Client,
}

impl ChatTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        // No overall timeout: the stream is long-lived. Connect failures
        // still surface promptly through reqwest.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Send the full history and receive assistant deltas as they arrive.
    /// The receiver closes after `Finish`/`Error` or the `[DONE]` marker.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        session: &SessionContext,
    ) -> CoreResult<mpsc::Receiver<StreamEvent>> {
        let body = ChatRequest {
            messages,
            patient_id: session.patient_id.as_deref(),
            clinic_id: session.clinic_id.as_deref(),
        };
        let url = format!("{}/text-agent/", self.base_url);
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(CoreError::Upstream { status, body });
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = res.bytes_stream();
            let mut buffer = SseLineBuffer::default();
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx
                            .send(StreamEvent::Error {
                                message: e.to_string(),
                            })
                            .await;
                        return;
                    }
                };
                for data in buffer.push_chunk(&chunk) {
                    if data == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<StreamEvent>(&data) {
                        Ok(event) => {
                            let terminal =
                                matches!(event, StreamEvent::Finish | StreamEvent::Error { .. });
                            if tx.send(event).await.is_err() || terminal {
                                return;
                            }
                        }
                        Err(e) => warn!("unparseable stream frame ({}): {}", e, data),
                    }
                }
            }
        });
        Ok(rx)
    }
}
