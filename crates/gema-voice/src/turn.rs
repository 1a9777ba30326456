//! Turn Controller — the `idle → listening → processing → speaking` machine.
//!
//! Owns the Silence Detector's single debounce timer, issues the remote
//! inference call, and drives playback. Partial-result callbacks fire at high
//! frequency and can race with the timer and with the processing transition;
//! the last-seen (debounce) and last-processed (dedup) guards on the session
//! keep the same utterance from being submitted twice.

use crate::error::{VoiceError, VoiceResult};
use crate::playback::AudioPlayer;
use crate::recognizer::{is_transient_recognizer_error, RecognizerEvent, SpeechRecognizer};
use crate::silence::{self, SilenceAction, DEFAULT_DEBOUNCE_WINDOW};
use crate::transcript::TranscriptBuffer;
use gema_core::{InferenceGateway, TurnReply};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Interaction status. Transition to `Idle` happens only on explicit close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Idle,
    Listening,
    Processing,
    Speaking,
}

/// The single live session. Guards are plain fields, mutated only through the
/// controller's transition methods.
#[derive(Debug, Clone)]
pub struct TurnSession {
    pub id: String,
    pub status: TurnStatus,
    /// Dedup guard: last utterance submitted to the gateway.
    pub last_processed: String,
    /// Debounce guard: last transcript value the timer was armed for.
    pub last_seen: String,
}

impl TurnSession {
    fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: TurnStatus::Idle,
            last_processed: String::new(),
            last_seen: String::new(),
        }
    }

    fn clear_guards(&mut self) {
        self.last_processed.clear();
        self.last_seen.clear();
    }
}

/// Configuration for turn detection.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// Silence after the last transcript change before the utterance is
    /// treated as complete (default: 2000ms).
    pub debounce_window: Duration,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

/// Notifications for the UI shell.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    StatusChanged(TurnStatus),
    /// Finalized utterance submitted for inference.
    UserUtterance(String),
    /// Reply text about to be spoken.
    AssistantReply(String),
    /// Non-fatal error; the session has already self-healed to listening.
    TurnError(String),
}

/// Handle for requesting close from outside the driver loop.
#[derive(Clone)]
pub struct TurnHandle {
    close_tx: mpsc::Sender<()>,
}

impl TurnHandle {
    pub fn close(&self) {
        let _ = self.close_tx.try_send(());
    }
}

/// The turn-taking state machine, generic over its three seams so the driver
/// stays single-threaded cooperative and testable without audio hardware.
pub struct TurnController<R, P, G> {
    config: TurnConfig,
    session: TurnSession,
    transcript: TranscriptBuffer,
    recognizer: R,
    player: P,
    gateway: G,
    /// At most one pending timer per session.
    debounce_deadline: Option<Instant>,
    event_tx: mpsc::UnboundedSender<TurnEvent>,
    close_rx: Option<mpsc::Receiver<()>>,
}

impl<R, P, G> TurnController<R, P, G>
where
    R: SpeechRecognizer,
    P: AudioPlayer,
    G: InferenceGateway,
{
    pub fn new(
        recognizer: R,
        player: P,
        gateway: G,
        config: TurnConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TurnEvent>, TurnHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = mpsc::channel(1);
        let controller = Self {
            config,
            session: TurnSession::new(),
            transcript: TranscriptBuffer::default(),
            recognizer,
            player,
            gateway,
            debounce_deadline: None,
            event_tx,
            close_rx: Some(close_rx),
        };
        (controller, event_rx, TurnHandle { close_tx })
    }

    pub fn status(&self) -> TurnStatus {
        self.session.status
    }

    pub fn session(&self) -> &TurnSession {
        &self.session
    }

    pub fn debounce_armed(&self) -> bool {
        self.debounce_deadline.is_some()
    }

    /// Open the interaction: request the microphone, configure the audio
    /// subsystem for duplex, start continuous recognition. Permission refusal
    /// is fatal; any setup error tears everything down before propagating, so
    /// no timer or microphone handle outlives a failed open.
    pub async fn open(&mut self) -> VoiceResult<()> {
        match self.try_open().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.close().await;
                Err(e)
            }
        }
    }

    async fn try_open(&mut self) -> VoiceResult<()> {
        self.recognizer.request_permission().await?;
        self.player.configure_duplex()?;
        self.set_status(TurnStatus::Listening);
        self.recognizer.start().await?;
        info!(session = %self.session.id, "voice interaction opened");
        Ok(())
    }

    /// Drive the session: recognizer events, the single debounce deadline,
    /// and the close signal, in one cooperative loop. Returns after close or
    /// when the recognizer event stream ends.
    pub async fn run(&mut self) -> VoiceResult<()> {
        let mut events = self
            .recognizer
            .take_events()
            .ok_or_else(|| VoiceError::Recognizer("event stream already taken".into()))?;
        let mut close_rx = self
            .close_rx
            .take()
            .ok_or_else(|| VoiceError::ChannelSend("controller already running".into()))?;

        enum Wake {
            Close,
            Event(Option<RecognizerEvent>),
            Debounce,
        }

        loop {
            let armed = self.debounce_deadline.is_some();
            let deadline = self.debounce_deadline.unwrap_or_else(Instant::now);
            let wake = tokio::select! {
                _ = close_rx.recv() => Wake::Close,
                event = events.recv() => Wake::Event(event),
                _ = tokio::time::sleep_until(deadline), if armed => Wake::Debounce,
            };
            match wake {
                Wake::Close | Wake::Event(None) => {
                    self.close().await;
                    return Ok(());
                }
                Wake::Event(Some(event)) => self.on_recognizer_event(event).await,
                Wake::Debounce => {
                    let Some(text) = self.take_utterance() else {
                        continue;
                    };
                    // A close during the in-flight turn must not wait for the
                    // inference call or playback: the turn future is dropped
                    // and teardown stops the player right away.
                    let interrupted = {
                        let turn = self.run_turn(text);
                        tokio::pin!(turn);
                        tokio::select! {
                            _ = close_rx.recv() => true,
                            _ = &mut turn => false,
                        }
                    };
                    if interrupted {
                        self.close().await;
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn on_recognizer_event(&mut self, event: RecognizerEvent) {
        match event {
            RecognizerEvent::Started | RecognizerEvent::End => {}
            RecognizerEvent::PartialResults(results) => {
                self.transcript.set_partials(results);
                self.on_transcript_changed();
            }
            RecognizerEvent::Results(results) => {
                self.transcript.set_finals(results);
                self.on_transcript_changed();
            }
            RecognizerEvent::Error { code, message } => {
                if is_transient_recognizer_error(&code, &message) {
                    debug!("transient recognizer noise ({}): {}", code, message);
                } else {
                    let err = VoiceError::Recognizer(format!("{}: {}", code, message));
                    self.emit(TurnEvent::TurnError(err.to_string()));
                }
            }
        }
    }

    /// Apply the Silence Detector's verdict to the single debounce timer.
    fn on_transcript_changed(&mut self) {
        let current = self.transcript.current().to_string();
        match silence::evaluate(&current, &self.session.last_seen, self.session.status) {
            SilenceAction::Cancel => {
                self.debounce_deadline = None;
                self.session.last_seen.clear();
            }
            SilenceAction::Rearm => {
                self.session.last_seen = current;
                self.debounce_deadline = Some(Instant::now() + self.config.debounce_window);
            }
            SilenceAction::None => {}
        }
    }

    /// The debounce window elapsed with no transcript change: finalize the
    /// utterance. A stale fire after the state has advanced, or one carrying
    /// an already-submitted value, yields nothing.
    fn take_utterance(&mut self) -> Option<String> {
        self.debounce_deadline = None;
        if self.session.status != TurnStatus::Listening {
            return None;
        }
        let text = self.session.last_seen.clone();
        if text.is_empty() || text == self.session.last_processed {
            return None;
        }
        self.session.last_processed = text.clone();
        Some(text)
    }

    /// One full turn: submit the utterance, speak the reply, return to
    /// listening. Inference failure self-heals rather than terminating.
    async fn run_turn(&mut self, text: String) {
        self.set_status(TurnStatus::Processing);
        self.emit(TurnEvent::UserUtterance(text.clone()));
        if let Err(e) = self.recognizer.stop().await {
            debug!("recognizer stop before inference: {}", e);
        }

        let outcome = match self.gateway.voice_turn(&text).await {
            Ok(reply) => self.speak_reply(reply).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome {
            warn!("turn failed: {}", e);
            self.emit(TurnEvent::TurnError(e.to_string()));
            if let Err(e) = self.resume_listening().await {
                self.emit(TurnEvent::TurnError(e.to_string()));
            }
        }
    }

    async fn speak_reply(&mut self, reply: TurnReply) -> VoiceResult<()> {
        self.set_status(TurnStatus::Speaking);
        self.emit(TurnEvent::AssistantReply(reply.text.clone()));
        let mime = format!("audio/{}", reply.format);
        self.player.load(&reply.audio, &mime)?;
        self.player.play()?;
        // Blocks the machine until the edge-triggered completion fires; it
        // fires exactly once per play cycle, so recognition cannot be
        // restarted twice by a lingering callback.
        self.player.finished().await?;
        self.resume_listening().await
    }

    async fn resume_listening(&mut self) -> VoiceResult<()> {
        self.transcript.clear();
        self.session.clear_guards();
        self.debounce_deadline = None;
        self.set_status(TurnStatus::Listening);
        self.recognizer.start().await
    }

    /// Tear down on every exit path: cancel the timer, stop and release the
    /// recognizer, stop playback. Cleanup errors are logged, never re-thrown.
    pub async fn close(&mut self) {
        self.debounce_deadline = None;
        if let Err(e) = self.recognizer.stop().await {
            debug!("recognizer already stopped: {}", e);
        }
        if let Err(e) = self.recognizer.destroy().await {
            warn!("{}", VoiceError::Cleanup(e.to_string()));
        }
        if self.player.is_playing() {
            self.player.stop();
        }
        self.transcript.clear();
        self.session.clear_guards();
        self.set_status(TurnStatus::Idle);
        info!(session = %self.session.id, "voice interaction closed");
    }

    fn set_status(&mut self, status: TurnStatus) {
        if self.session.status != status {
            debug!(?status, "turn status");
            self.session.status = status;
            self.emit(TurnEvent::StatusChanged(status));
        }
    }

    fn emit(&self, event: TurnEvent) {
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gema_core::{CoreError, CoreResult, SpeechReply, Voice};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct MockRecognizer {
        permission_granted: bool,
        events_rx: Option<mpsc::UnboundedReceiver<RecognizerEvent>>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        destroys: Arc<AtomicUsize>,
    }

    impl MockRecognizer {
        fn new(permission_granted: bool) -> (Self, mpsc::UnboundedSender<RecognizerEvent>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Self {
                    permission_granted,
                    events_rx: Some(rx),
                    starts: Arc::new(AtomicUsize::new(0)),
                    stops: Arc::new(AtomicUsize::new(0)),
                    destroys: Arc::new(AtomicUsize::new(0)),
                },
                tx,
            )
        }
    }

    #[async_trait::async_trait(?Send)]
    impl SpeechRecognizer for MockRecognizer {
        async fn request_permission(&mut self) -> VoiceResult<()> {
            if self.permission_granted {
                Ok(())
            } else {
                Err(VoiceError::PermissionDenied)
            }
        }

        async fn start(&mut self) -> VoiceResult<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&mut self) -> VoiceResult<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn destroy(&mut self) -> VoiceResult<()> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<RecognizerEvent>> {
            self.events_rx.take()
        }
    }

    #[derive(Default)]
    struct MockPlayer {
        playing: bool,
        cycle_armed: bool,
        stops: usize,
        finishes: Arc<AtomicUsize>,
        finish_delay: Option<Duration>,
    }

    #[async_trait::async_trait(?Send)]
    impl AudioPlayer for MockPlayer {
        fn configure_duplex(&mut self) -> VoiceResult<()> {
            Ok(())
        }

        fn load(&mut self, _audio: &[u8], _mime: &str) -> VoiceResult<()> {
            Ok(())
        }

        fn play(&mut self) -> VoiceResult<()> {
            self.playing = true;
            self.cycle_armed = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.playing = false;
            self.stops += 1;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        async fn finished(&mut self) -> VoiceResult<()> {
            if !self.cycle_armed {
                return Err(VoiceError::Playback("no active play cycle".into()));
            }
            if let Some(delay) = self.finish_delay {
                tokio::time::sleep(delay).await;
            }
            self.cycle_armed = false;
            self.playing = false;
            self.finishes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MockGateway {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl MockGateway {
        fn ok() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl InferenceGateway for MockGateway {
        async fn voice_turn(&self, message: &str) -> CoreResult<TurnReply> {
            self.calls.lock().unwrap().push(message.to_string());
            if self.fail {
                return Err(CoreError::Upstream {
                    status: 502,
                    body: "connection reset".into(),
                });
            }
            Ok(TurnReply {
                text: "a reply".into(),
                audio: vec![0u8; 16],
                format: "mp3".into(),
            })
        }

        async fn generate_speech(
            &self,
            _text: &str,
            _voice: Option<Voice>,
        ) -> CoreResult<SpeechReply> {
            Ok(SpeechReply {
                audio: vec![0u8; 16],
                format: "mp3".into(),
            })
        }
    }

    type Controller = TurnController<MockRecognizer, MockPlayer, MockGateway>;

    async fn run_for(controller: &mut Controller, duration: Duration) {
        tokio::select! {
            result = controller.run() => result.unwrap(),
            _ = tokio::time::sleep(duration) => {}
        }
    }

    fn partial(text: &str) -> RecognizerEvent {
        RecognizerEvent::PartialResults(vec![text.to_string()])
    }

    #[tokio::test(start_paused = true)]
    async fn trailing_silence_triggers_exactly_one_inference() {
        let (recognizer, tx) = MockRecognizer::new(true);
        let starts = recognizer.starts.clone();
        let gateway = MockGateway::ok();
        let calls = gateway.calls.clone();
        let (mut controller, _events, _handle) =
            TurnController::new(recognizer, MockPlayer::default(), gateway, TurnConfig::default());

        controller.open().await.unwrap();
        for text in ["", "hel", "hello", "hello"] {
            tx.send(partial(text)).unwrap();
        }
        run_for(&mut controller, Duration::from_millis(2500)).await;

        assert_eq!(&*calls.lock().unwrap(), &["hello".to_string()]);
        assert_eq!(controller.status(), TurnStatus::Listening);
        // Initial start plus exactly one restart after the spoken reply.
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert!(!controller.debounce_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn network_error_self_heals_to_listening() {
        let (recognizer, tx) = MockRecognizer::new(true);
        let starts = recognizer.starts.clone();
        let gateway = MockGateway::failing();
        let calls = gateway.calls.clone();
        let (mut controller, mut events, _handle) =
            TurnController::new(recognizer, MockPlayer::default(), gateway, TurnConfig::default());

        controller.open().await.unwrap();
        tx.send(partial("turn off the lights")).unwrap();
        run_for(&mut controller, Duration::from_millis(2500)).await;

        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(controller.status(), TurnStatus::Listening);
        assert!(controller.session().last_processed.is_empty());
        assert!(controller.session().last_seen.is_empty());
        assert_eq!(starts.load(Ordering::SeqCst), 2);

        let mut saw_error = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, TurnEvent::TurnError(_)) {
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test(start_paused = true)]
    async fn playback_completion_resumes_listening_exactly_once() {
        let (recognizer, tx) = MockRecognizer::new(true);
        let starts = recognizer.starts.clone();
        let player = MockPlayer::default();
        let finishes = player.finishes.clone();
        let (mut controller, mut events, _handle) =
            TurnController::new(recognizer, player, MockGateway::ok(), TurnConfig::default());

        controller.open().await.unwrap();
        tx.send(partial("hello")).unwrap();
        run_for(&mut controller, Duration::from_millis(2500)).await;

        assert_eq!(finishes.load(Ordering::SeqCst), 1);
        assert_eq!(starts.load(Ordering::SeqCst), 2);

        let mut speaking_to_listening = 0;
        let mut previous = TurnStatus::Idle;
        while let Ok(event) = events.try_recv() {
            if let TurnEvent::StatusChanged(status) = event {
                if previous == TurnStatus::Speaking && status == TurnStatus::Listening {
                    speaking_to_listening += 1;
                }
                previous = status;
            }
        }
        assert_eq!(speaking_to_listening, 1);
    }

    #[tokio::test]
    async fn dedup_guard_submits_at_most_once() {
        let (recognizer, _tx) = MockRecognizer::new(true);
        let gateway = MockGateway::ok();
        let calls = gateway.calls.clone();
        let (mut controller, _events, _handle) =
            TurnController::new(recognizer, MockPlayer::default(), gateway, TurnConfig::default());

        controller.open().await.unwrap();
        controller.session.last_seen = "hello".into();
        let first = controller.take_utterance();
        assert_eq!(first.as_deref(), Some("hello"));

        // Timer fired again with the same value before the turn advanced:
        // the dedup guard must swallow it.
        assert!(controller.take_utterance().is_none());

        controller.run_turn(first.unwrap()).await;
        assert_eq!(&*calls.lock().unwrap(), &["hello".to_string()]);
    }

    #[tokio::test]
    async fn debounce_fire_outside_listening_is_a_noop() {
        let (recognizer, _tx) = MockRecognizer::new(true);
        let gateway = MockGateway::ok();
        let calls = gateway.calls.clone();
        let (mut controller, _events, _handle) =
            TurnController::new(recognizer, MockPlayer::default(), gateway, TurnConfig::default());

        controller.open().await.unwrap();
        controller.session.status = TurnStatus::Processing;
        controller.session.last_seen = "hello".into();
        assert!(controller.take_utterance().is_none());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_during_speaking_stops_playback_immediately() {
        let (recognizer, tx) = MockRecognizer::new(true);
        let destroys = recognizer.destroys.clone();
        let player = MockPlayer {
            // A long clip: close must not wait for it to finish.
            finish_delay: Some(Duration::from_secs(30)),
            ..MockPlayer::default()
        };
        let finishes = player.finishes.clone();
        let (mut controller, _events, handle) =
            TurnController::new(recognizer, player, MockGateway::ok(), TurnConfig::default());

        controller.open().await.unwrap();
        tx.send(partial("hello")).unwrap();
        let closer = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            closer.close();
        });

        let start = Instant::now();
        controller.run().await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(30));
        assert_eq!(controller.status(), TurnStatus::Idle);
        assert_eq!(finishes.load(Ordering::SeqCst), 0);
        assert!(controller.player.stops >= 1);
        assert!(!controller.player.is_playing());
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn identical_updates_do_not_rearm_the_timer() {
        let (recognizer, _tx) = MockRecognizer::new(true);
        let (mut controller, _events, _handle) = TurnController::new(
            recognizer,
            MockPlayer::default(),
            MockGateway::ok(),
            TurnConfig::default(),
        );

        controller.open().await.unwrap();
        controller.transcript.set_partials(vec!["hello".into()]);
        controller.on_transcript_changed();
        let first_deadline = controller.debounce_deadline;
        assert!(first_deadline.is_some());

        for _ in 0..5 {
            controller.transcript.set_partials(vec!["hello".into()]);
            controller.on_transcript_changed();
        }
        assert_eq!(controller.debounce_deadline, first_deadline);
    }

    #[tokio::test]
    async fn empty_transcript_cancels_pending_timer() {
        let (recognizer, _tx) = MockRecognizer::new(true);
        let (mut controller, _events, _handle) = TurnController::new(
            recognizer,
            MockPlayer::default(),
            MockGateway::ok(),
            TurnConfig::default(),
        );

        controller.open().await.unwrap();
        controller.transcript.set_partials(vec!["hello".into()]);
        controller.on_transcript_changed();
        assert!(controller.debounce_armed());

        controller.transcript.set_partials(vec!["".into()]);
        controller.on_transcript_changed();
        assert!(!controller.debounce_armed());
        assert!(controller.session().last_seen.is_empty());
    }

    #[tokio::test]
    async fn close_from_any_state_leaves_no_handles() {
        for status in [TurnStatus::Listening, TurnStatus::Processing, TurnStatus::Speaking] {
            let (recognizer, _tx) = MockRecognizer::new(true);
            let destroys = recognizer.destroys.clone();
            let (mut controller, _events, _handle) = TurnController::new(
                recognizer,
                MockPlayer::default(),
                MockGateway::ok(),
                TurnConfig::default(),
            );

            controller.open().await.unwrap();
            controller.session.status = status;
            controller.session.last_seen = "pending".into();
            controller.debounce_deadline = Some(Instant::now() + Duration::from_secs(2));
            controller.player.play().unwrap();

            controller.close().await;

            assert_eq!(controller.status(), TurnStatus::Idle, "from {:?}", status);
            assert!(!controller.debounce_armed());
            assert!(controller.session().last_seen.is_empty());
            assert!(controller.session().last_processed.is_empty());
            assert_eq!(destroys.load(Ordering::SeqCst), 1);
            assert!(!controller.player.is_playing());
        }
    }

    #[tokio::test]
    async fn permission_denied_is_fatal_and_tears_down() {
        let (recognizer, _tx) = MockRecognizer::new(false);
        let destroys = recognizer.destroys.clone();
        let (mut controller, _events, _handle) = TurnController::new(
            recognizer,
            MockPlayer::default(),
            MockGateway::ok(),
            TurnConfig::default(),
        );

        let err = controller.open().await.unwrap_err();
        assert!(matches!(err, VoiceError::PermissionDenied));
        assert_eq!(controller.status(), TurnStatus::Idle);
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_signal_stops_the_driver() {
        let (recognizer, tx) = MockRecognizer::new(true);
        let (mut controller, _events, handle) = TurnController::new(
            recognizer,
            MockPlayer::default(),
            MockGateway::ok(),
            TurnConfig::default(),
        );

        controller.open().await.unwrap();
        tx.send(partial("hel")).unwrap();
        handle.close();
        // The driver must return on its own once the close signal lands.
        controller.run().await.unwrap();
        assert_eq!(controller.status(), TurnStatus::Idle);
        assert!(!controller.debounce_armed());
    }
}
