//! PCM16 payload decoding
//!
//! Synthesis backends return raw little-endian signed 16-bit PCM, base64
//! encoded. This module converts that into normalized `f32` frames.

use crate::error::{NarratorError, NarratorResult};
use base64::{engine::general_purpose, Engine as _};
use std::time::Duration;

/// Sample rate of synthesized speech
pub const SAMPLE_RATE: u32 = 24_000;

/// Synthesized speech is mono
pub const CHANNELS: u16 = 1;

const PCM16_SCALE: f32 = 32768.0;

/// Decoded audio ready for an output device.
///
/// Samples are interleaved and normalized to `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Frames per channel
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Samples of a single channel, for channel-major consumers
    pub fn channel(&self, index: u16) -> Vec<f32> {
        if index >= self.channels {
            return Vec::new();
        }
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

/// Base64-decode a synthesis payload.
///
/// An empty (or whitespace-only) payload is reported as `EmptyPayload`.
pub fn decode_base64(payload: &str) -> NarratorResult<Vec<u8>> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(NarratorError::EmptyPayload);
    }

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| NarratorError::Decode(format!("Invalid base64 payload: {}", e)))
}

/// Interpret raw bytes as interleaved little-endian PCM16.
///
/// A trailing partial frame is dropped.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> NarratorResult<AudioBuffer> {
    if channels == 0 {
        return Err(NarratorError::Decode("Channel count must be positive".into()));
    }
    if sample_rate == 0 {
        return Err(NarratorError::Decode("Sample rate must be positive".into()));
    }

    let frame_bytes = 2 * channels as usize;
    let frame_count = bytes.len() / frame_bytes;
    let usable = frame_count * frame_bytes;

    if usable < bytes.len() {
        tracing::debug!(
            "Dropping {} trailing byte(s) of partial PCM frame",
            bytes.len() - usable
        );
    }

    let samples = bytes[..usable]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / PCM16_SCALE)
        .collect();

    Ok(AudioBuffer::new(sample_rate, channels, samples))
}

/// Full decode path: base64 payload to playable buffer
pub fn decode_payload(
    payload: &str,
    sample_rate: u32,
    channels: u16,
) -> NarratorResult<AudioBuffer> {
    let bytes = decode_base64(payload)?;
    decode_pcm16(&bytes, sample_rate, channels)
}

/// Encode samples the way synthesis backends deliver them
pub fn encode_pcm16_base64(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    general_purpose::STANDARD.encode(bytes)
}
