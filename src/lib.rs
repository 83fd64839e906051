//! BiteWise Narrator Library
//!
//! Narrated recipe playback: remote speech synthesis decoded from PCM16,
//! played through a single owned session, with device-native fallback.

pub mod audio;
pub mod config;
pub mod error;
pub mod narration;
pub mod tts;

pub use narration::{NarrationController, SessionState};
