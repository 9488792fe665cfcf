//! Zoom level and pixel/time conversion.
//!
//! Zoom only affects how seconds map to screen pixels, and through that the
//! snap threshold. It never changes the model.

use serde::{Deserialize, Serialize};
use vibeclip_core::{Seconds, TimelineConfig};

/// Horizontal zoom of the timeline view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zoom {
    pub factor: f64,
}

impl Zoom {
    pub const DEFAULT: Self = Self { factor: 1.0 };

    /// Create a zoom level clamped to the configured range.
    pub fn new(factor: f64, config: &TimelineConfig) -> Self {
        let factor = if factor.is_finite() {
            factor.clamp(config.zoom_min, config.zoom_max)
        } else {
            Self::DEFAULT.factor
        };
        Self { factor }
    }

    /// One step closer.
    pub fn zoomed_in(self, config: &TimelineConfig) -> Self {
        Self::new(self.factor + config.zoom_step, config)
    }

    /// One step further.
    pub fn zoomed_out(self, config: &TimelineConfig) -> Self {
        Self::new(self.factor - config.zoom_step, config)
    }

    pub fn pixels_per_second(self, config: &TimelineConfig) -> f64 {
        config.base_pixels_per_second * self.factor
    }

    /// Snap distance in timeline seconds, constant on screen across zoom levels.
    pub fn snap_threshold(self, config: &TimelineConfig) -> Seconds {
        config.snap_distance_px / self.pixels_per_second(config)
    }

    /// Timeline time under a horizontal pixel offset (scroll included), never negative.
    pub fn time_at_pixel(self, x: f64, config: &TimelineConfig) -> Seconds {
        (x / self.pixels_per_second(config)).max(0.0)
    }

    /// Pixel offset of a timeline time.
    pub fn pixel_at_time(self, time: Seconds, config: &TimelineConfig) -> f64 {
        time * self.pixels_per_second(config)
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Span the view shows: the timeline duration, but never less than the configured minimum.
pub fn display_duration(duration: Seconds, config: &TimelineConfig) -> Seconds {
    duration.max(config.min_display_duration)
}
