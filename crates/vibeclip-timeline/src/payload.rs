//! Drag/drop payloads accepted by the placement resolver.
//!
//! Payloads arrive as JSON tagged on `"type"`. They are parsed into
//! [`DropPayload`] and validated into a [`PlacementRequest`] before anything
//! touches the timeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vibeclip_core::{ensure_finite, parse_clock, Result, Seconds, TimeSpan, VibeClipError};

use crate::track::TrackKind;

/// Tolerance when checking that a shot's source window matches its duration.
const SOURCE_LENGTH_TOLERANCE: Seconds = 1e-6;

/// A duration given either in seconds or as a clock string such as `"4:10"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Clock(String),
}

impl DurationValue {
    /// Resolve to seconds.
    pub fn seconds(&self) -> Result<Seconds> {
        match self {
            Self::Seconds(s) => Ok(*s),
            Self::Clock(text) => parse_clock(text),
        }
    }
}

impl From<f64> for DurationValue {
    fn from(seconds: f64) -> Self {
        Self::Seconds(seconds)
    }
}

/// What is being dropped onto the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DropPayload {
    /// A whole video asset from the media library.
    #[serde(rename_all = "camelCase")]
    NewMedia { source_id: String, duration: f64 },
    /// A sub-range of a video asset.
    #[serde(rename_all = "camelCase")]
    ExistingShot {
        source_id: String,
        source_start: f64,
        source_end: f64,
        duration: f64,
    },
    /// A music or sound asset; `source_id` is its path.
    #[serde(rename_all = "camelCase")]
    AudioAsset {
        source_id: String,
        duration: DurationValue,
    },
    /// A clip already on the timeline being dragged elsewhere.
    #[serde(rename_all = "camelCase")]
    MoveClip {
        clip_id: Uuid,
        track_id: Uuid,
        duration: f64,
    },
}

/// A validated placement request.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementRequest {
    /// Create a clip of `kind` from `source` of `source_id`.
    Create {
        kind: TrackKind,
        source_id: String,
        source: TimeSpan,
    },
    /// Relocate an existing clip.
    Move {
        clip_id: Uuid,
        track_hint: Option<Uuid>,
    },
}

impl DropPayload {
    /// Parse a JSON payload. Does not validate.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|e| VibeClipError::InvalidPayload(format!("Malformed drop payload: {}", e)))
    }

    /// Validate the payload into a placement request.
    pub fn validate(&self) -> Result<PlacementRequest> {
        match self {
            Self::NewMedia {
                source_id,
                duration,
            } => Ok(PlacementRequest::Create {
                kind: TrackKind::Video,
                source_id: require_source(source_id)?,
                source: TimeSpan::new(0.0, require_duration(*duration)?),
            }),
            Self::ExistingShot {
                source_id,
                source_start,
                source_end,
                duration,
            } => {
                let start = ensure_finite("sourceStart", *source_start)?;
                let end = ensure_finite("sourceEnd", *source_end)?;
                let duration = require_duration(*duration)?;
                if start < 0.0 || end <= start {
                    return Err(VibeClipError::InvalidPayload(format!(
                        "Shot source window [{start}, {end}) is empty or negative"
                    )));
                }
                if ((end - start) - duration).abs() > SOURCE_LENGTH_TOLERANCE {
                    return Err(VibeClipError::InvalidPayload(format!(
                        "Shot duration {duration} does not match source window [{start}, {end})"
                    )));
                }
                Ok(PlacementRequest::Create {
                    kind: TrackKind::Video,
                    source_id: require_source(source_id)?,
                    source: TimeSpan::new(start, end),
                })
            }
            Self::AudioAsset {
                source_id,
                duration,
            } => Ok(PlacementRequest::Create {
                kind: TrackKind::Audio,
                source_id: require_source(source_id)?,
                source: TimeSpan::new(0.0, require_duration(duration.seconds()?)?),
            }),
            Self::MoveClip {
                clip_id, track_id, ..
            } => Ok(PlacementRequest::Move {
                clip_id: *clip_id,
                track_hint: (!track_id.is_nil()).then_some(*track_id),
            }),
        }
    }
}

fn require_source(source_id: &str) -> Result<String> {
    if source_id.trim().is_empty() {
        return Err(VibeClipError::InvalidPayload(
            "Payload has an empty sourceId".into(),
        ));
    }
    Ok(source_id.to_string())
}

fn require_duration(duration: f64) -> Result<Seconds> {
    let duration = ensure_finite("duration", duration)?;
    if duration <= 0.0 {
        return Err(VibeClipError::InvalidPayload(format!(
            "Duration must be positive, got {duration}"
        )));
    }
    Ok(duration)
}
