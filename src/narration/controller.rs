//! Narration Controller
//!
//! Owns at most one narration session at a time. Every `speak` mints a new
//! session token; asynchronous continuations act only while their token is
//! still current, so a slow request from an old session can never start
//! audio or fire its completion after a newer session began.

use crate::audio::pcm;
use crate::audio::{AudioBuffer, AudioOutput, Playback, PlaybackHandle, RodioOutput};
use crate::config::Config;
use crate::error::{NarratorError, NarratorResult};
use crate::tts::{self, FallbackSpeaker, SynthesisClient};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Completion action, invoked at most once per session
pub type OnEnded = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Requesting,
    Decoding,
    Playing,
    Completed,
    Stopped,
    Failed,
}

impl SessionState {
    /// Requesting, decoding or playing
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Requesting | SessionState::Decoding | SessionState::Playing
        )
    }
}

/// Why remote synthesis produced nothing playable
#[derive(Debug)]
pub enum UnavailableReason {
    Request(NarratorError),
    EmptyPayload,
    Decode(NarratorError),
    Timeout(Duration),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Request(e) => write!(f, "request failed: {}", e),
            UnavailableReason::EmptyPayload => write!(f, "no audio returned"),
            UnavailableReason::Decode(e) => write!(f, "{}", e),
            UnavailableReason::Timeout(limit) => {
                write!(f, "no response within {}s", limit.as_secs_f32())
            }
        }
    }
}

/// Outcome of the remote half of the pipeline
#[derive(Debug)]
pub enum Synthesis {
    Ready(AudioBuffer),
    Unavailable(UnavailableReason),
}

impl Synthesis {
    /// Decode a synthesis response into a playable buffer, or say why not.
    ///
    /// A payload too short to hold a single frame counts as empty.
    pub fn classify(
        response: Result<String, UnavailableReason>,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        let payload = match response {
            Ok(payload) => payload,
            Err(reason) => return Synthesis::Unavailable(reason),
        };

        match pcm::decode_payload(&payload, sample_rate, channels) {
            Ok(buffer) if buffer.is_empty() => {
                Synthesis::Unavailable(UnavailableReason::EmptyPayload)
            }
            Ok(buffer) => Synthesis::Ready(buffer),
            Err(NarratorError::EmptyPayload) => {
                Synthesis::Unavailable(UnavailableReason::EmptyPayload)
            }
            Err(e) => Synthesis::Unavailable(UnavailableReason::Decode(e)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NarrationSettings {
    pub sample_rate: u32,
    pub channels: u16,
    /// `None` waits on the synthesis backend indefinitely
    pub synthesis_timeout: Option<Duration>,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for NarrationSettings {
    fn from(config: &Config) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            synthesis_timeout: config.synthesis_timeout(),
        }
    }
}

/// The single session slot
struct SessionSlot {
    token: u64,
    state: SessionState,
    handle: Option<Box<dyn PlaybackHandle>>,
}

struct Shared {
    synthesizer: Arc<dyn SynthesisClient>,
    output: Arc<dyn AudioOutput>,
    fallback: Arc<dyn FallbackSpeaker>,
    settings: NarrationSettings,
    slot: Mutex<SessionSlot>,
    state_tx: watch::Sender<SessionState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, slot: &mut SessionSlot, state: SessionState) {
        slot.state = state;
        self.state_tx.send_replace(state);
    }

    fn is_current(&self, token: u64) -> bool {
        self.lock().token == token
    }

    /// Move the session forward if it is still current
    fn transition(&self, token: u64, state: SessionState) -> bool {
        let mut slot = self.lock();
        if slot.token != token {
            return false;
        }
        self.set_state(&mut slot, state);
        true
    }

    fn stop(&self) {
        let handle = {
            let mut slot = self.lock();
            slot.token = slot.token.wrapping_add(1);
            if slot.state.is_active() {
                info!("🛑 Stopping narration");
                self.set_state(&mut slot, SessionState::Stopped);
            }
            slot.handle.take()
        };

        if let Some(mut handle) = handle {
            if let Err(e) = handle.stop() {
                warn!("⚠️ Error stopping narration playback: {}", e);
            }
        }
        if let Err(e) = self.fallback.cancel() {
            warn!("⚠️ Error cancelling fallback speech: {}", e);
        }
    }

    async fn run(self: Arc<Self>, token: u64, text: String, on_ended: Option<OnEnded>) {
        let response = self.request(&text).await;
        if !self.transition(token, SessionState::Decoding) {
            debug!("Discarding synthesis result of superseded session #{}", token);
            return;
        }

        let synthesis =
            Synthesis::classify(response, self.settings.sample_rate, self.settings.channels);

        let playback = match synthesis {
            Synthesis::Ready(buffer) => match self.output.play(buffer).await {
                Ok(playback) => Some(playback),
                Err(e) => {
                    warn!("⚠️ Audio output failed, using fallback speech: {}", e);
                    None
                }
            },
            Synthesis::Unavailable(reason) => {
                warn!(
                    "⚠️ {} TTS unavailable ({}), using fallback speech",
                    self.synthesizer.name(),
                    reason
                );
                None
            }
        };

        match playback {
            Some(playback) => self.attend(token, playback, on_ended).await,
            None => self.narrate_fallback(token, &text, on_ended).await,
        }
    }

    async fn request(&self, text: &str) -> Result<String, UnavailableReason> {
        let request = self.synthesizer.synthesize(text);
        let response = match self.settings.synthesis_timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(response) => response,
                Err(_) => return Err(UnavailableReason::Timeout(limit)),
            },
            None => request.await,
        };

        response.map_err(|e| match e {
            NarratorError::EmptyPayload => UnavailableReason::EmptyPayload,
            other => UnavailableReason::Request(other),
        })
    }

    async fn narrate_fallback(&self, token: u64, text: &str, on_ended: Option<OnEnded>) {
        if !self.is_current(token) {
            return;
        }

        match self.fallback.speak(text).await {
            Ok(playback) => self.attend(token, playback, on_ended).await,
            Err(e) => {
                warn!("⚠️ Fallback speech ({}) unavailable: {}", self.fallback.name(), e);
                self.finish(token, false, None);
            }
        }
    }

    /// Hold the playback in the session slot until it ends
    async fn attend(&self, token: u64, playback: Playback, on_ended: Option<OnEnded>) {
        let Playback {
            mut handle,
            finished,
        } = playback;

        {
            let mut slot = self.lock();
            if slot.token != token {
                drop(slot);
                debug!("Session #{} superseded before playback began", token);
                if let Err(e) = handle.stop() {
                    warn!("⚠️ Error releasing superseded playback: {}", e);
                }
                return;
            }
            slot.handle = Some(handle);
            self.set_state(&mut slot, SessionState::Playing);
        }

        let natural = finished.await.is_ok();
        self.finish(token, natural, on_ended);
    }

    fn finish(&self, token: u64, natural: bool, on_ended: Option<OnEnded>) {
        let callback = {
            let mut slot = self.lock();
            if slot.token != token {
                debug!("Ignoring end of superseded session #{}", token);
                return;
            }
            slot.handle = None;
            if natural {
                debug!("Session #{} completed", token);
                self.set_state(&mut slot, SessionState::Completed);
                on_ended
            } else {
                warn!("⚠️ Narration session #{} ended without completing", token);
                self.set_state(&mut slot, SessionState::Failed);
                None
            }
        };

        // Called unlocked so the callback may speak or stop again
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Plays narration through remote synthesis with a device-native fallback
pub struct NarrationController {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl fmt::Debug for NarrationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NarrationController")
            .field("synthesizer", &self.shared.synthesizer.name())
            .field("output", &self.shared.output.name())
            .field("fallback", &self.shared.fallback.name())
            .field("state", &self.state())
            .finish()
    }
}

impl NarrationController {
    /// Must be called from within a tokio runtime
    pub fn new(
        synthesizer: Arc<dyn SynthesisClient>,
        output: Arc<dyn AudioOutput>,
        fallback: Arc<dyn FallbackSpeaker>,
        settings: NarrationSettings,
    ) -> NarratorResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| NarratorError::Runtime(format!("No tokio runtime: {}", e)))?;
        let (state_tx, _) = watch::channel(SessionState::Stopped);

        Ok(Self {
            shared: Arc::new(Shared {
                synthesizer,
                output,
                fallback,
                settings,
                slot: Mutex::new(SessionSlot {
                    token: 0,
                    state: SessionState::Stopped,
                    handle: None,
                }),
                state_tx,
            }),
            runtime,
        })
    }

    /// Build with the configured backends and the rodio output
    pub fn from_config(config: &Config) -> NarratorResult<Self> {
        config.validate()?;
        let synthesizer = tts::create_synthesis_client(config)?;
        let output: Arc<dyn AudioOutput> = Arc::new(RodioOutput::new()?);
        let fallback = tts::create_fallback(config);
        Self::new(synthesizer, output, fallback, NarrationSettings::from(config))
    }

    /// Narrate `text`, replacing any current session.
    ///
    /// Returns immediately; `on_ended` fires once if the narration plays to
    /// its natural end. It never fires for a stopped or superseded session.
    pub fn speak(&self, text: impl Into<String>, on_ended: Option<OnEnded>) {
        let text = text.into();
        self.shared.stop();

        if text.trim().is_empty() {
            debug!("Ignoring empty narration text");
            return;
        }

        let token = {
            let mut slot = self.shared.lock();
            slot.token = slot.token.wrapping_add(1);
            self.shared.set_state(&mut slot, SessionState::Requesting);
            slot.token
        };

        info!("📢 Narrating {} chars (session #{})", text.len(), token);
        let shared = self.shared.clone();
        self.runtime.spawn(shared.run(token, text, on_ended));
    }

    /// Cancel the current session, if any. Never invokes its `on_ended`.
    pub fn stop(&self) {
        self.shared.stop();
    }

    /// Stop when narrating, otherwise start narrating `text`
    pub fn toggle(&self, text: impl Into<String>, on_ended: Option<OnEnded>) {
        if self.is_active() {
            self.stop();
        } else {
            self.speak(text, on_ended);
        }
    }

    /// State of the current or most recent session
    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// Watch session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }
}

impl Drop for NarrationController {
    fn drop(&mut self) {
        self.shared.stop();
    }
}
