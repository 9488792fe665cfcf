//! Track types for the timeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vibeclip_core::{Seconds, TimeSpan};

use crate::clip::Clip;

/// Kind of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Effect,
}

impl TrackKind {
    /// Display label used when naming new tracks.
    pub fn label(self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Subtitle => "Subtitle",
            Self::Effect => "Effect",
        }
    }
}

/// A track holding non-overlapping clips of one kind.
///
/// Clips are kept in insertion order; use [`Track::sorted_clips`] when
/// timeline order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track ID
    pub id: Uuid,
    /// Track kind
    #[serde(rename = "type")]
    pub kind: TrackKind,
    /// Track name
    pub name: String,
    /// Is track muted
    #[serde(rename = "isMuted")]
    pub muted: bool,
    /// Is track locked (prevent edits)
    #[serde(rename = "isLocked")]
    pub locked: bool,
    /// Track volume, 0..=100
    pub volume: u8,
    /// Clips in insertion order
    pub clips: Vec<Clip>,
}

impl Track {
    /// Create a new empty track.
    pub fn new(kind: TrackKind, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: name.into(),
            muted: false,
            locked: false,
            volume: 100,
            clips: Vec::new(),
        }
    }

    /// Create a new video track.
    pub fn new_video(name: impl Into<String>) -> Self {
        Self::new(TrackKind::Video, name)
    }

    /// Create a new audio track.
    pub fn new_audio(name: impl Into<String>) -> Self {
        Self::new(TrackKind::Audio, name)
    }

    /// Set the volume, clamped to 0..=100.
    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume.min(100);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Number of clips in this track.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Latest end time on this track, or zero when empty.
    pub fn end_time(&self) -> Seconds {
        self.clips.iter().map(|c| c.end_time).fold(0.0, f64::max)
    }

    /// True if `span` would overlap any clip except `exclude`.
    pub fn overlaps(&self, span: TimeSpan, exclude: Option<Uuid>) -> bool {
        self.clips
            .iter()
            .filter(|c| Some(c.id) != exclude)
            .any(|c| c.span().overlaps(span))
    }

    /// True if the track can take a clip at `span`.
    pub fn accepts(&self, span: TimeSpan) -> bool {
        !self.locked && !self.overlaps(span, None)
    }

    /// Append a clip, claiming it for this track.
    pub fn push_clip(&mut self, mut clip: Clip) {
        clip.track_id = self.id;
        self.clips.push(clip);
    }

    /// Find a clip by UUID.
    pub fn find_clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// Remove a clip by UUID. Returns the removed clip.
    pub fn remove_clip(&mut self, id: Uuid) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id == id)?;
        Some(self.clips.remove(index))
    }

    /// Clips ordered by start time.
    pub fn sorted_clips(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.iter().collect();
        clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        clips
    }
}
