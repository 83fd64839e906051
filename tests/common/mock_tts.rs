//! Mock TTS collaborators for Testing
//!
//! Scripted synthesis replies and a fallback speaker that records what it
//! was asked to say.

use super::mock_output::Ledger;
use async_trait::async_trait;
use narrator::audio::Playback;
use narrator::error::{NarratorError, NarratorResult};
use narrator::tts::{FallbackSpeaker, SynthesisClient};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Scripted synthesis outcome
#[derive(Debug)]
pub enum Reply {
    Audio(String),
    Empty,
    Fail,
    Hang,
    /// Resolves with whatever the test sends; a dropped sender fails
    Gated(oneshot::Receiver<String>),
}

/// Mock synthesis backend; an unscripted request fails
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Queue a reply the test releases later
    pub fn gate(&self) -> oneshot::Sender<String> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisClient for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> NarratorResult<String> {
        self.requests.lock().unwrap().push(text.to_string());
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Audio(audio)) => Ok(audio),
            Some(Reply::Empty) => Err(NarratorError::EmptyPayload),
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Gated(rx)) => rx
                .await
                .map_err(|_| NarratorError::Synthesis("Gate dropped".into())),
            Some(Reply::Fail) | None => Err(NarratorError::Synthesis("Mock TTS failure".into())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock fallback speaker that records spoken text
#[derive(Debug, Default)]
pub struct MockFallback {
    pub spoken: Mutex<Vec<String>>,
    pub ledger: Ledger,
    pub cancels: AtomicUsize,
    pub should_fail: AtomicBool,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockFallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Hold the next `speak` until the test releases it
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl FallbackSpeaker for MockFallback {
    async fn speak(&self, text: &str) -> NarratorResult<Playback> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NarratorError::Fallback("Mock fallback failure".into()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(self.ledger.start())
    }

    fn cancel(&self) -> NarratorResult<()> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
