//! Narrator Error Types
//!
//! Centralized error handling for the narration pipeline.

use thiserror::Error;

/// Central error type for the narrator
#[derive(Error, Debug)]
pub enum NarratorError {
    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Speech synthesis returned no audio")]
    EmptyPayload,

    #[error("Audio decode error: {0}")]
    Decode(String),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Fallback speech error: {0}")]
    Fallback(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for narrator operations
pub type NarratorResult<T> = Result<T, NarratorError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for NarratorError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        NarratorError::Runtime(format!("Lock poisoned: {}", err))
    }
}
