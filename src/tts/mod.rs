//! TTS (Text-to-Speech) Module
//!
//! Remote synthesis backends return PCM16 payloads for the narration
//! controller to decode; fallback speakers read text aloud on-device.

use crate::audio::Playback;
use crate::config::Config;
use crate::error::NarratorResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod gemini;
pub mod proxy;
pub mod system;

/// Remote speech synthesis
#[async_trait]
pub trait SynthesisClient: Send + Sync + std::fmt::Debug {
    /// Synthesize `text`, returning base64 PCM16 mono audio.
    ///
    /// A response without audio is `NarratorError::EmptyPayload`.
    async fn synthesize(&self, text: &str) -> NarratorResult<String>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Device-native speech used when remote synthesis is unavailable
#[async_trait]
pub trait FallbackSpeaker: Send + Sync + std::fmt::Debug {
    /// Start reading `text` aloud
    async fn speak(&self, text: &str) -> NarratorResult<Playback>;

    /// Cancel any utterance in progress
    fn cancel(&self) -> NarratorResult<()>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Fallback that stays silent
#[derive(Debug, Default)]
pub struct SilentSpeaker;

#[async_trait]
impl FallbackSpeaker for SilentSpeaker {
    async fn speak(&self, _text: &str) -> NarratorResult<Playback> {
        Err(crate::error::NarratorError::Fallback(
            "Fallback speech disabled".into(),
        ))
    }

    fn cancel(&self) -> NarratorResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Factory to create the configured synthesis backend
pub fn create_synthesis_client(config: &Config) -> NarratorResult<Arc<dyn SynthesisClient>> {
    let client: Arc<dyn SynthesisClient> = match config.synthesis_backend.as_str() {
        "gemini" => {
            info!("  - Using Gemini TTS (Voice: {})", config.voice_name);
            Arc::new(gemini::GeminiClient::new(config)?)
        }
        "proxy" => {
            info!("  - Using TTS proxy at {}", config.proxy_url);
            Arc::new(proxy::ProxyClient::new(&config.proxy_url)?)
        }
        other => {
            warn!("  - Unknown backend '{}', falling back to proxy", other);
            Arc::new(proxy::ProxyClient::new(&config.proxy_url)?)
        }
    };
    info!("✅ Synthesis backend '{}' initialized", client.name());
    Ok(client)
}

/// Factory to create the configured fallback speaker
pub fn create_fallback(config: &Config) -> Arc<dyn FallbackSpeaker> {
    match config.fallback_engine.as_str() {
        "none" => Arc::new(SilentSpeaker),
        "system" => Arc::new(system::SystemSpeaker::new()),
        other => {
            warn!("  - Unknown fallback '{}', using system speech", other);
            Arc::new(system::SystemSpeaker::new())
        }
    }
}
