//! Beat markers produced by music analysis.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vibeclip_core::Seconds;

/// A detected beat. Advisory only; the timeline never edits markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatMarker {
    pub id: Uuid,
    pub timestamp: Seconds,
    /// Beat intensity, 0..=1
    pub strength: f32,
    /// Whether a clip edge sits on this beat
    pub is_snapped: bool,
}

impl BeatMarker {
    pub fn new(timestamp: Seconds, strength: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            strength: strength.clamp(0.0, 1.0),
            is_snapped: false,
        }
    }

    /// Markers with a usable timestamp.
    pub fn is_valid(&self) -> bool {
        self.timestamp.is_finite() && self.timestamp >= 0.0
    }
}
