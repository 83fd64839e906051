use crate::error::{NarratorError, NarratorResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main narrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Synthesis
    pub synthesis_backend: String,
    pub proxy_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub voice_name: String,
    pub synthesis_timeout_secs: u64,

    // Audio
    pub sample_rate: u32,
    pub channels: u16,

    // Fallback
    pub fallback_engine: String,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            synthesis_backend: "proxy".to_string(),
            proxy_url: "http://localhost:3001".to_string(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice_name: "Kore".to_string(),
            synthesis_timeout_secs: 30,
            sample_rate: crate::audio::pcm::SAMPLE_RATE,
            channels: crate::audio::pcm::CHANNELS,
            fallback_engine: "system".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or create default
    pub fn load() -> NarratorResult<Self> {
        let mut config = Self::load_from(&config_path())?;
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                config.gemini_api_key = key;
            }
        }
        Ok(config)
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> NarratorResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                // Keep the broken file around for inspection
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    /// Save config to an explicit path
    pub fn save_to(&self, path: &Path) -> NarratorResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Synthesis timeout, `None` when disabled
    pub fn synthesis_timeout(&self) -> Option<Duration> {
        match self.synthesis_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn validate(&self) -> NarratorResult<()> {
        if self.sample_rate == 0 {
            return Err(NarratorError::Config("sample_rate must be positive".into()));
        }
        if self.channels == 0 {
            return Err(NarratorError::Config("channels must be positive".into()));
        }
        match self.synthesis_backend.as_str() {
            "proxy" | "gemini" => Ok(()),
            other => Err(NarratorError::Config(format!(
                "Unknown synthesis backend '{}'",
                other
            ))),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bitewise-narrator")
        .join("config.json")
}
