//! Engine configuration.
//!
//! Every field has a default so a config file only needs to name what it
//! overrides. Files are JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeClipError};

/// How to choose between several snap points inside the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapTieBreak {
    /// First point in iteration order (zero, then clip edges in track order).
    #[default]
    FirstMatch,
    /// Closest point to the candidate.
    Nearest,
}

/// Placement and viewport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfig {
    /// Pixels per second at zoom 1.0.
    pub base_pixels_per_second: f64,
    /// Snap distance in pixels (divided by pixels-per-second to get seconds).
    pub snap_distance_px: f64,
    /// Trailing margin added past the last clip when the timeline grows.
    pub duration_padding: f64,
    /// Minimum span the viewport shows, even for a short timeline.
    pub min_display_duration: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    /// Zoom in/out step.
    pub zoom_step: f64,
    pub snap_tie_break: SnapTieBreak,
    /// Also offer beat marker timestamps as snap points.
    pub snap_to_beats: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_pixels_per_second: 20.0,
            snap_distance_px: 10.0,
            duration_padding: 5.0,
            min_display_duration: 30.0,
            zoom_min: 0.1,
            zoom_max: 5.0,
            zoom_step: 0.2,
            snap_tie_break: SnapTieBreak::FirstMatch,
            snap_to_beats: false,
        }
    }
}

/// Playback synchronization tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// How close to a clip's end native progress must get to trigger a hand-off.
    pub boundary_guard: f64,
    /// A time this close to the last clip's end still resolves to that clip.
    pub end_epsilon: f64,
    /// Divergence between expected and actual source time that forces a seek.
    pub drift_tolerance: f64,
    /// Feedback suppression after an explicit seek, in milliseconds.
    pub seek_settle_ms: u64,
    /// Feedback suppression after a clip hand-off, in milliseconds.
    pub transition_settle_ms: u64,
    /// Initial master volume (0..=100).
    pub default_volume: u8,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            boundary_guard: 0.05,
            end_epsilon: 0.1,
            drift_tolerance: 0.2,
            seek_settle_ms: 100,
            transition_settle_ms: 50,
            default_volume: 80,
        }
    }
}

impl PlaybackConfig {
    pub fn seek_settle(&self) -> Duration {
        Duration::from_millis(self.seek_settle_ms)
    }

    pub fn transition_settle(&self) -> Duration {
        Duration::from_millis(self.transition_settle_ms)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub timeline: TimelineConfig,
    pub playback: PlaybackConfig,
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| VibeClipError::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| VibeClipError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.timeline;
        let positive = [
            ("timeline.basePixelsPerSecond", t.base_pixels_per_second),
            ("timeline.snapDistancePx", t.snap_distance_px),
            ("timeline.zoomMin", t.zoom_min),
            ("timeline.zoomMax", t.zoom_max),
            ("timeline.zoomStep", t.zoom_step),
            ("playback.boundaryGuard", self.playback.boundary_guard),
            ("playback.endEpsilon", self.playback.end_epsilon),
            ("playback.driftTolerance", self.playback.drift_tolerance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(VibeClipError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("timeline.durationPadding", t.duration_padding),
            ("timeline.minDisplayDuration", t.min_display_duration),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(VibeClipError::Config(format!(
                    "{name} must not be negative, got {value}"
                )));
            }
        }

        if t.zoom_min > t.zoom_max {
            return Err(VibeClipError::Config(format!(
                "timeline.zoomMin ({}) exceeds timeline.zoomMax ({})",
                t.zoom_min, t.zoom_max
            )));
        }
        if self.playback.default_volume > 100 {
            return Err(VibeClipError::Config(format!(
                "playback.defaultVolume must be 0..=100, got {}",
                self.playback.default_volume
            )));
        }
        Ok(())
    }
}
