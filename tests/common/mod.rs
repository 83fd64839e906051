pub mod mock_output;
pub mod mock_tts;

use narrator::narration::{NarrationController, NarrationSettings, OnEnded, SessionState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub use mock_output::MockOutput;
pub use mock_tts::{MockFallback, MockSynthesizer, Reply};

pub struct TestContext {
    pub synthesizer: Arc<MockSynthesizer>,
    pub output: Arc<MockOutput>,
    pub fallback: Arc<MockFallback>,
    pub controller: NarrationController,
    pub states: watch::Receiver<SessionState>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(NarrationSettings::default())
    }

    pub fn with_settings(settings: NarrationSettings) -> Self {
        let synthesizer = Arc::new(MockSynthesizer::new());
        let output = Arc::new(MockOutput::new());
        let fallback = Arc::new(MockFallback::new());
        let controller = NarrationController::new(
            synthesizer.clone(),
            output.clone(),
            fallback.clone(),
            settings,
        )
        .expect("Failed to create controller");
        let states = controller.subscribe();

        Self {
            synthesizer,
            output,
            fallback,
            controller,
            states,
        }
    }

    /// Wait until the controller reports `want`
    pub async fn wait_for(&mut self, want: SessionState) {
        let states = &mut self.states;
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if *states.borrow_and_update() == want {
                    return;
                }
                states.changed().await.expect("Controller dropped");
            }
        })
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for {:?}", want));
    }
}

/// Let spawned narration tasks run to their next suspension point
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

/// Completion callback that counts its invocations
pub fn counter() -> (Arc<AtomicUsize>, OnEnded) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = count.clone();
    let callback: OnEnded = Box::new(move || {
        hits.fetch_add(1, Ordering::SeqCst);
    });
    (count, callback)
}

pub fn hits(count: &AtomicUsize) -> usize {
    count.load(Ordering::SeqCst)
}
