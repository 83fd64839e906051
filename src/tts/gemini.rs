//! Direct Gemini speech synthesis
//!
//! Calls `generateContent` with an audio response modality and a prebuilt
//! voice. The reply carries base64 PCM16 at 24 kHz in the first inline part.

use super::SynthesisClient;
use crate::config::Config;
use crate::error::{NarratorError, NarratorResult};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: Option<String>,
    #[allow(dead_code)]
    mime_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> NarratorResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            voice: config.voice_name.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.voice }
                    }
                }
            }
        })
    }
}

/// First candidate's first inline audio part
fn extract_audio(body: &str) -> NarratorResult<String> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    response
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .and_then(|p| p.into_iter().next())
        .and_then(|p| p.inline_data)
        .and_then(|d| d.data)
        .filter(|d| !d.trim().is_empty())
        .ok_or(NarratorError::EmptyPayload)
}

#[async_trait]
impl SynthesisClient for GeminiClient {
    async fn synthesize(&self, text: &str) -> NarratorResult<String> {
        if self.api_key.is_empty() {
            return Err(NarratorError::Synthesis(
                "Gemini API key not configured".into(),
            ));
        }

        debug!(model = %self.model, voice = %self.voice, "Requesting Gemini TTS");

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_body(text))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("❌ Gemini TTS error ({}): {}", status, body);
            return Err(NarratorError::Synthesis(format!("HTTP {}", status)));
        }

        extract_audio(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
