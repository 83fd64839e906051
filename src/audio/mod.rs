//! Audio decode and playback
//!
//! `pcm` turns synthesized PCM16 payloads into playable buffers, `output`
//! owns the device side.

pub mod output;
pub mod pcm;

pub use output::{AudioOutput, Playback, PlaybackHandle, RodioOutput};
pub use pcm::AudioBuffer;
