//! System fallback speech (speech-dispatcher or espeak-ng)

use super::FallbackSpeaker;
use crate::audio::{Playback, PlaybackHandle};
use crate::error::{NarratorError, NarratorResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};

/// Commands tried in order: program and the args placed before the text
const CANDIDATES: &[(&str, &[&str])] = &[("spd-say", &["--wait"]), ("espeak-ng", &[])];

#[derive(Debug, Default)]
pub struct SystemSpeaker {
    current: Mutex<Option<Arc<Notify>>>,
}

impl SystemSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_first_available(text: &str) -> NarratorResult<(&'static str, Child)> {
        for &(program, args) in CANDIDATES {
            match Command::new(program)
                .args(args)
                .arg(text)
                .kill_on_drop(true)
                .spawn()
            {
                Ok(child) => return Ok((program, child)),
                Err(e) => debug!("{} unavailable: {}", program, e),
            }
        }

        Err(NarratorError::Fallback(
            "No system TTS command found (tried spd-say, espeak-ng)".into(),
        ))
    }

    /// Wait for the child to exit or be cancelled
    async fn supervise(
        program: &'static str,
        mut child: Child,
        cancel: Arc<Notify>,
        finished: oneshot::Sender<()>,
    ) {
        let status = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel.notified() => None,
        };

        match status {
            Some(Ok(status)) if status.success() => {
                let _ = finished.send(());
            }
            Some(Ok(status)) => warn!("⚠️ {} exited with {}", program, status),
            Some(Err(e)) => warn!("⚠️ Failed waiting on {}: {}", program, e),
            None => {
                debug!("Cancelling {} utterance", program);
                if let Err(e) = child.kill().await {
                    debug!("{} already exited: {}", program, e);
                }
                // speech-dispatcher keeps speaking after its client dies
                if program == "spd-say" {
                    if let Err(e) = Command::new("spd-say").arg("--cancel").status().await {
                        debug!("spd-say --cancel failed: {}", e);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl FallbackSpeaker for SystemSpeaker {
    async fn speak(&self, text: &str) -> NarratorResult<Playback> {
        debug!("System speaking: {}", text);
        self.cancel()?;

        let (program, child) = Self::spawn_first_available(text)?;
        let cancel = Arc::new(Notify::new());
        let (finished_tx, finished_rx) = oneshot::channel();

        *self.current.lock()? = Some(cancel.clone());
        tokio::spawn(Self::supervise(program, child, cancel.clone(), finished_tx));

        Ok(Playback {
            handle: Box::new(SystemUtterance { cancel }),
            finished: finished_rx,
        })
    }

    fn cancel(&self) -> NarratorResult<()> {
        if let Some(cancel) = self.current.lock()?.take() {
            cancel.notify_one();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "system"
    }
}

#[derive(Debug)]
struct SystemUtterance {
    cancel: Arc<Notify>,
}

impl PlaybackHandle for SystemUtterance {
    fn stop(&mut self) -> NarratorResult<()> {
        self.cancel.notify_one();
        Ok(())
    }
}
