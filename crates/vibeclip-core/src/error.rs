//! Error types for VibeClip.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for VibeClip operations.
#[derive(Error, Debug)]
pub enum VibeClipError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Non-finite time for `{field}`: {value}")]
    NonFiniteTime { field: &'static str, value: f64 },

    #[error("Clip not found: {0}")]
    ClipNotFound(Uuid),

    #[error("Track not found: {0}")]
    TrackNotFound(Uuid),

    #[error("Track is locked: {0}")]
    TrackLocked(Uuid),

    #[error("Timeline invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Media source not found: {0}")]
    SourceNotFound(String),

    #[error("Playback handle error: {0}")]
    Handle(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for VibeClip operations.
pub type Result<T> = std::result::Result<T, VibeClipError>;
