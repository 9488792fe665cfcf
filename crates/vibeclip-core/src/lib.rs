//! VibeClip Core - Foundation types for the timeline engine
//!
//! This crate provides the fundamental types used throughout VibeClip:
//! - Time spans in seconds with half-open overlap semantics
//! - Clock-style duration formatting and parsing
//! - Engine configuration (snapping, padding, playback tolerances)
//! - The shared error type

pub mod config;
pub mod error;
pub mod time;

pub use config::{EditorConfig, PlaybackConfig, SnapTieBreak, TimelineConfig};
pub use error::{Result, VibeClipError};
pub use time::{ensure_finite, format_duration, parse_clock, Seconds, TimeSpan};
