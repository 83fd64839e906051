//! Mock Audio Output for Testing
//!
//! Records played buffers; tests end playback by hand.

use async_trait::async_trait;
use narrator::audio::{AudioBuffer, AudioOutput, Playback, PlaybackHandle};
use narrator::error::{NarratorError, NarratorResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Started playbacks, by index, and which of them were stopped
#[derive(Debug, Default)]
pub struct Ledger {
    finishers: Arc<Mutex<Vec<Option<oneshot::Sender<()>>>>>,
    stops: Arc<Mutex<Vec<usize>>>,
}

impl Ledger {
    pub fn start(&self) -> Playback {
        let (tx, rx) = oneshot::channel();
        let mut finishers = self.finishers.lock().unwrap();
        finishers.push(Some(tx));
        Playback {
            handle: Box::new(MockHandle {
                index: finishers.len() - 1,
                finishers: self.finishers.clone(),
                stops: self.stops.clone(),
            }),
            finished: rx,
        }
    }

    /// End playback `index` naturally; false if it was already torn down
    pub fn finish(&self, index: usize) -> bool {
        let sender = self
            .finishers
            .lock()
            .unwrap()
            .get_mut(index)
            .and_then(|slot| slot.take());
        match sender {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    pub fn stopped(&self) -> Vec<usize> {
        self.stops.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct MockHandle {
    index: usize,
    finishers: Arc<Mutex<Vec<Option<oneshot::Sender<()>>>>>,
    stops: Arc<Mutex<Vec<usize>>>,
}

impl PlaybackHandle for MockHandle {
    fn stop(&mut self) -> NarratorResult<()> {
        self.stops.lock().unwrap().push(self.index);
        // Tear down without signalling a natural end
        self.finishers.lock().unwrap()[self.index].take();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockOutput {
    pub played: Mutex<Vec<AudioBuffer>>,
    pub ledger: Ledger,
    pub should_fail: AtomicBool,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }

    pub fn fail_next(&self) {
        self.should_fail.store(true, Ordering::SeqCst);
    }

    /// Hold the next `play` until the test releases it
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }
}

#[async_trait]
impl AudioOutput for MockOutput {
    async fn play(&self, buffer: AudioBuffer) -> NarratorResult<Playback> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        if self.should_fail.swap(false, Ordering::SeqCst) {
            return Err(NarratorError::Output("Mock output failure".into()));
        }
        self.played.lock().unwrap().push(buffer);
        Ok(self.ledger.start())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
