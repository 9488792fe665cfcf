//! Time representation for timeline editing
//!
//! Timeline positions and source offsets are plain seconds (`f64`). Spans are
//! half-open: a span contains its start but not its end, so two spans that only
//! touch at an endpoint do not overlap.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VibeClipError};

/// Seconds on the timeline or within a source.
pub type Seconds = f64;

/// A half-open time span `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Start time (inclusive)
    pub start: Seconds,
    /// End time (exclusive)
    pub end: Seconds,
}

impl TimeSpan {
    /// Create a span from start and end times.
    #[inline]
    pub fn new(start: Seconds, end: Seconds) -> Self {
        Self { start, end }
    }

    /// Create a span from a start time and a duration.
    #[inline]
    pub fn from_start_duration(start: Seconds, duration: Seconds) -> Self {
        Self {
            start,
            end: start + duration,
        }
    }

    /// Length of the span.
    #[inline]
    pub fn duration(self) -> Seconds {
        self.end - self.start
    }

    /// Check if a time is within this span.
    #[inline]
    pub fn contains(self, time: Seconds) -> bool {
        time >= self.start && time < self.end
    }

    /// Check if two spans overlap. Touching endpoints do not overlap.
    #[inline]
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// True when both bounds are finite and `start < end`.
    pub fn is_valid(self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }
}

/// Reject NaN and infinities, naming the offending field.
pub fn ensure_finite(field: &'static str, value: Seconds) -> Result<Seconds> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VibeClipError::NonFiniteTime { field, value })
    }
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` past the hour.
///
/// Non-finite and negative inputs render as `00:00`.
pub fn format_duration(seconds: Seconds) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Parse a clock-style duration (`"4:10"`, `"1:02:03"`, or plain `"12.5"`).
pub fn parse_clock(text: &str) -> Result<Seconds> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.trim().is_empty()) {
        return Err(VibeClipError::InvalidPayload(format!(
            "Malformed clock duration: {text:?}"
        )));
    }

    let mut total = 0.0;
    for part in &parts {
        let value: f64 = part.trim().parse().map_err(|_| {
            VibeClipError::InvalidPayload(format!("Malformed clock duration: {text:?}"))
        })?;
        if value < 0.0 {
            return Err(VibeClipError::InvalidPayload(format!(
                "Negative clock component in {text:?}"
            )));
        }
        total = total * 60.0 + value;
    }
    ensure_finite("duration", total)
}
