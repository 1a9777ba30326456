//! Audio Playback Adapter — one concurrently-playing reply stream.
//!
//! Wraps a `rodio::Sink` behind the [`AudioPlayer`] seam. The platform only
//! offers a poll-based "still playing" flag, so the poll is wrapped here once,
//! as an edge-triggered `finished` signal; the Turn Controller never polls.

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// Playback seam used by the Turn Controller.
#[async_trait(?Send)]
pub trait AudioPlayer {
    /// Configure the audio subsystem for simultaneous playback + recording.
    fn configure_duplex(&mut self) -> VoiceResult<()>;

    /// Stage a reply clip for playback.
    fn load(&mut self, audio: &[u8], mime: &str) -> VoiceResult<()>;

    /// Start playing the loaded clip.
    fn play(&mut self) -> VoiceResult<()>;

    /// Stop immediately and clear the queue.
    fn stop(&mut self);

    fn is_playing(&self) -> bool;

    /// Edge-triggered completion: resolves exactly once per play cycle, when
    /// playback transitions from playing to not-playing.
    async fn finished(&mut self) -> VoiceResult<()>;
}

/// Poll interval for the completion watcher.
const FINISH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Rodio-backed playback on the default output device.
pub struct RodioPlayer {
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sink: Arc<Sink>,
    loaded: Option<Vec<u8>>,
    finished_rx: Option<oneshot::Receiver<()>>,
}

impl RodioPlayer {
    pub fn new() -> VoiceResult<Self> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| VoiceError::Playback(e.to_string()))?;
        let sink =
            Sink::try_new(&stream_handle).map_err(|e| VoiceError::Playback(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            _stream_handle: stream_handle,
            sink: Arc::new(sink),
            loaded: None,
            finished_rx: None,
        })
    }
}

#[async_trait(?Send)]
impl AudioPlayer for RodioPlayer {
    fn configure_duplex(&mut self) -> VoiceResult<()> {
        // Desktop output devices do not need an explicit duplex mode; the
        // recognizer owns the input device independently.
        Ok(())
    }

    fn load(&mut self, audio: &[u8], mime: &str) -> VoiceResult<()> {
        debug!("loading {} bytes ({})", audio.len(), mime);
        self.loaded = Some(audio.to_vec());
        Ok(())
    }

    fn play(&mut self) -> VoiceResult<()> {
        let bytes = self
            .loaded
            .take()
            .ok_or_else(|| VoiceError::Playback("no clip loaded".into()))?;
        if bytes.is_empty() {
            return Err(VoiceError::Playback("empty clip".into()));
        }
        let source = rodio::Decoder::new(Cursor::new(bytes))
            .map_err(|e| VoiceError::Playback(format!("decode failed: {}", e)))?;
        self.sink.append(source.convert_samples::<f32>());

        // One watcher per play cycle; the oneshot guarantees the finished
        // signal fires at most once even if the sink drains and refills.
        let sink = Arc::clone(&self.sink);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(FINISH_POLL_INTERVAL).await;
                if sink.empty() {
                    let _ = tx.send(());
                    return;
                }
            }
        });
        self.finished_rx = Some(rx);
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.stop();
        debug!("playback stopped");
    }

    fn is_playing(&self) -> bool {
        !self.sink.empty()
    }

    async fn finished(&mut self) -> VoiceResult<()> {
        let rx = self
            .finished_rx
            .take()
            .ok_or_else(|| VoiceError::Playback("no active play cycle".into()))?;
        rx.await
            .map_err(|_| VoiceError::Playback("completion watcher dropped".into()))
    }
}
