//! Synthesis through the application's TTS proxy
//!
//! POST {base}/api/tts with `{"text": ...}`; success is
//! `{"audio": <base64>, "format": "base64"}`, failure `{"error", "message"}`.

use super::SynthesisClient;
use crate::error::{NarratorError, NarratorResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    audio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TtsErrorBody {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> NarratorResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn tts_url(&self) -> String {
        format!("{}/api/tts", self.base_url)
    }
}

/// Pull the audio out of a success body
fn parse_audio(body: &str) -> NarratorResult<String> {
    let response: TtsResponse = serde_json::from_str(body)?;
    match response.audio {
        Some(audio) if !audio.trim().is_empty() => Ok(audio),
        _ => Err(NarratorError::EmptyPayload),
    }
}

/// Best description of a failure body
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<TtsErrorBody>(body) {
        Ok(TtsErrorBody {
            error: Some(error),
            message: Some(message),
        }) => format!("HTTP {}: {} ({})", status, error, message),
        Ok(TtsErrorBody {
            error: Some(error), ..
        }) => format!("HTTP {}: {}", status, error),
        _ => format!("HTTP {}: {}", status, body),
    }
}

#[async_trait]
impl SynthesisClient for ProxyClient {
    async fn synthesize(&self, text: &str) -> NarratorResult<String> {
        if text.trim().is_empty() {
            return Err(NarratorError::Synthesis(
                "Text is required and must be a string".into(),
            ));
        }

        debug!(url = %self.tts_url(), text_len = text.len(), "Sending TTS request");

        let response = self
            .client
            .post(self.tts_url())
            .json(&TtsRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(NarratorError::Synthesis(describe_error(status, &body)));
        }

        parse_audio(&body)
    }

    fn name(&self) -> &str {
        "proxy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio() {
        let audio = parse_audio(r#"{"audio": "AAAA", "format": "base64"}"#).unwrap();
        assert_eq!(audio, "AAAA");
    }

    #[test]
    fn test_missing_audio_is_empty_payload() {
        assert!(matches!(
            parse_audio(r#"{"format": "base64"}"#),
            Err(NarratorError::EmptyPayload)
        ));
        assert!(matches!(
            parse_audio(r#"{"audio": ""}"#),
            Err(NarratorError::EmptyPayload)
        ));
    }

    #[test]
    fn test_describe_error() {
        let body = r#"{"error": "Failed to generate text-to-speech", "message": "quota"}"#;
        let msg = describe_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(msg.contains("500"));
        assert!(msg.contains("quota"));

        let msg = describe_error(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(msg.contains("upstream down"));
    }

    #[test]
    fn test_url_trailing_slash() {
        let client = ProxyClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.tts_url(), "http://localhost:3001/api/tts");
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let client = ProxyClient::new("http://localhost:3001").unwrap();
        assert!(matches!(
            client.synthesize("   ").await,
            Err(NarratorError::Synthesis(_))
        ));
    }
}
