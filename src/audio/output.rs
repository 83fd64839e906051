//! Audio output for decoded narration
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! A dedicated audio thread owns the output stream and one sink per
//! playback; callers only hold lightweight handles.

use super::pcm::AudioBuffer;
use crate::error::{NarratorError, NarratorResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Device side of narration playback
#[async_trait]
pub trait AudioOutput: Send + Sync + std::fmt::Debug {
    /// Start playing `buffer`, returning once audio is underway
    async fn play(&self, buffer: AudioBuffer) -> NarratorResult<Playback>;

    /// Get the output name
    fn name(&self) -> &str;
}

/// Control over one started playback
pub trait PlaybackHandle: Send + std::fmt::Debug {
    /// Halt playback immediately and release its device resources
    fn stop(&mut self) -> NarratorResult<()>;
}

/// A started playback.
///
/// `finished` resolves with `Ok(())` only on natural end of audio; it
/// errors when the playback was torn down instead.
#[derive(Debug)]
pub struct Playback {
    pub handle: Box<dyn PlaybackHandle>,
    pub finished: oneshot::Receiver<()>,
}

/// Commands sent to the audio thread
enum AudioCommand {
    Play {
        id: u64,
        buffer: AudioBuffer,
        finished: oneshot::Sender<()>,
        ready: oneshot::Sender<NarratorResult<()>>,
    },
    Stop {
        id: u64,
    },
}

/// Thread-safe handle to the rodio audio thread
#[derive(Clone)]
pub struct RodioOutput {
    sender: mpsc::Sender<AudioCommand>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput").finish()
    }
}

impl RodioOutput {
    pub fn new() -> NarratorResult<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("narrator-audio".to_string())
            .spawn(move || {
                Self::audio_thread(receiver);
            })?;

        Ok(Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>) {
        use rodio::OutputStream;

        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                // Keep answering so callers fall back instead of hanging
                let reason = e.to_string();
                while let Ok(cmd) = receiver.recv() {
                    if let AudioCommand::Play { ready, .. } = cmd {
                        let _ = ready.send(Err(NarratorError::Output(format!(
                            "No audio output device: {}",
                            reason
                        ))));
                    }
                }
                return;
            }
        };

        // Keep stream alive
        let _stream = stream;
        let mut active: Option<(u64, rodio::Sink)> = None;

        info!("🔊 Audio thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                AudioCommand::Play {
                    id,
                    buffer,
                    finished,
                    ready,
                } => {
                    if let Some((old_id, sink)) = active.take() {
                        debug!("Releasing playback #{} before #{}", old_id, id);
                        sink.stop();
                    }

                    match rodio::Sink::try_new(&stream_handle) {
                        Ok(sink) => {
                            info!(
                                "🔊 Playing narration #{} ({:.1}s)",
                                id,
                                buffer.duration().as_secs_f32()
                            );
                            Self::queue_buffer(&sink, buffer, finished);
                            active = Some((id, sink));
                            let _ = ready.send(Ok(()));
                        }
                        Err(e) => {
                            error!("❌ Failed to create audio sink: {}", e);
                            let _ = ready.send(Err(NarratorError::Output(e.to_string())));
                        }
                    }
                }
                AudioCommand::Stop { id } => match active.take() {
                    Some((active_id, sink)) if active_id == id => {
                        info!("🛑 Stopping narration #{}", id);
                        sink.stop();
                    }
                    other => {
                        debug!("Playback #{} already released", id);
                        active = other;
                    }
                },
            }
        }

        info!("🔇 Audio thread stopped");
    }

    /// Append the samples followed by an end marker that fires `finished`.
    fn queue_buffer(sink: &rodio::Sink, buffer: AudioBuffer, finished: oneshot::Sender<()>) {
        use rodio::buffer::SamplesBuffer;
        use rodio::source::EmptyCallback;

        let channels = buffer.channels();
        let sample_rate = buffer.sample_rate();
        sink.append(SamplesBuffer::new(
            channels,
            sample_rate,
            buffer.into_samples(),
        ));

        let notify = Mutex::new(Some(finished));
        sink.append(EmptyCallback::<f32>::new(Box::new(move || {
            if let Some(tx) = notify.lock().ok().and_then(|mut slot| slot.take()) {
                let _ = tx.send(());
            }
        })));
        sink.play();
    }
}

#[async_trait]
impl AudioOutput for RodioOutput {
    async fn play(&self, buffer: AudioBuffer) -> NarratorResult<Playback> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (finished_tx, finished_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        self.sender
            .send(AudioCommand::Play {
                id,
                buffer,
                finished: finished_tx,
                ready: ready_tx,
            })
            .map_err(|e| NarratorError::Output(format!("Audio thread disconnected: {}", e)))?;

        ready_rx
            .await
            .map_err(|_| NarratorError::Output("Audio thread dropped play request".into()))??;

        Ok(Playback {
            handle: Box::new(RodioPlayback {
                id,
                sender: self.sender.clone(),
            }),
            finished: finished_rx,
        })
    }

    fn name(&self) -> &str {
        "rodio"
    }
}

/// Handle to one sink on the audio thread
struct RodioPlayback {
    id: u64,
    sender: mpsc::Sender<AudioCommand>,
}

impl std::fmt::Debug for RodioPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioPlayback").field("id", &self.id).finish()
    }
}

impl PlaybackHandle for RodioPlayback {
    fn stop(&mut self) -> NarratorResult<()> {
        self.sender
            .send(AudioCommand::Stop { id: self.id })
            .map_err(|e| NarratorError::Output(format!("Audio thread disconnected: {}", e)))
    }
}
