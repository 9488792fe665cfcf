//! Clip types for the timeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vibeclip_core::{Seconds, TimeSpan};

/// Transition style carried on a clip. The engine stores it but does not render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionKind {
    #[default]
    None,
    Fade,
    Dissolve,
    Wipe,
    Zoom,
    Slide,
}

/// A transition into this clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    pub duration: Seconds,
}

/// A clip on the timeline: a window `[source_start, source_end)` of a source
/// asset placed at `[start_time, end_time)`.
///
/// Both windows always have the same length; clips never change speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    /// Unique clip ID
    pub id: Uuid,
    /// Track currently holding the clip
    pub track_id: Uuid,
    /// Opaque source identity (asset id for video, path for audio)
    pub source_id: String,
    /// Position on the timeline
    pub start_time: Seconds,
    pub end_time: Seconds,
    /// Window within the source
    pub source_start: Seconds,
    pub source_end: Seconds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl Clip {
    /// Create a clip covering `source` of `source_id`, starting at `start_time`.
    ///
    /// The track id is assigned when the clip is placed.
    pub fn new(source_id: impl Into<String>, start_time: Seconds, source: TimeSpan) -> Self {
        Self {
            id: Uuid::new_v4(),
            track_id: Uuid::nil(),
            source_id: source_id.into(),
            start_time,
            end_time: start_time + source.duration(),
            source_start: source.start,
            source_end: source.end,
            transition: None,
        }
    }

    /// Create a clip occupying exactly `span` on the timeline.
    ///
    /// `span` and `source` must have the same length; the span's bounds are
    /// kept as given so snapped edges stay exact.
    pub fn placed(source_id: impl Into<String>, span: TimeSpan, source: TimeSpan) -> Self {
        let mut clip = Self::new(source_id, span.start, source);
        clip.end_time = span.end;
        clip
    }

    /// Length on the timeline.
    #[inline]
    pub fn duration(&self) -> Seconds {
        self.end_time - self.start_time
    }

    /// Timeline span.
    #[inline]
    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start_time, self.end_time)
    }

    /// Source span.
    #[inline]
    pub fn source_span(&self) -> TimeSpan {
        TimeSpan::new(self.source_start, self.source_end)
    }

    /// True when the two clips occupy overlapping timeline ranges.
    #[inline]
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.span().overlaps(other.span())
    }

    /// Map a timeline time inside this clip to a source time.
    #[inline]
    pub fn source_time_at(&self, timeline_time: Seconds) -> Seconds {
        self.source_start + (timeline_time - self.start_time)
    }

    /// Map a source time to the timeline time it plays at.
    #[inline]
    pub fn timeline_time_at(&self, source_time: Seconds) -> Seconds {
        self.start_time + (source_time - self.source_start)
    }

    /// Reposition the clip onto an exact span of the same length.
    pub fn set_span(&mut self, span: TimeSpan) {
        self.start_time = span.start;
        self.end_time = span.end;
    }
}
