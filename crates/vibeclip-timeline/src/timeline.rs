//! The timeline aggregate: tracks, clips, beat markers and zoom.
//!
//! All mutation goes through the methods here (or [`crate::TimelineCommand`]),
//! which keep four invariants:
//! - clips on one track never overlap
//! - every clip has `start_time < end_time`
//! - every clip's source window is as long as its timeline span
//! - `duration` equals the value re-derived from the clips

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use vibeclip_core::{ensure_finite, Result, Seconds, TimeSpan, TimelineConfig, VibeClipError};

use crate::clip::Clip;
use crate::marker::BeatMarker;
use crate::payload::{DropPayload, PlacementRequest};
use crate::placement::{
    find_or_create_track, primary_track_id, prune_empty_tracks, SnapEdge, SnappingEngine,
};
use crate::track::{Track, TrackKind};
use crate::viewport::{display_duration, Zoom};

/// Smallest allowed difference between a clip's source length and timeline
/// length. Far from zero the allowance grows with the spacing of `f64`.
pub const LENGTH_TOLERANCE: Seconds = 1e-9;

fn length_tolerance(clip: &Clip) -> Seconds {
    let magnitude = [
        clip.start_time,
        clip.end_time,
        clip.source_start,
        clip.source_end,
    ]
    .into_iter()
    .map(f64::abs)
    .fold(0.0, f64::max);
    LENGTH_TOLERANCE.max(8.0 * f64::EPSILON * magnitude)
}

/// Result of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub clip_id: Uuid,
    pub track_id: Uuid,
    pub span: TimeSpan,
    pub snapped: Option<SnapEdge>,
    pub created_track: bool,
}

/// Immutable copy of the timeline handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSnapshot {
    pub tracks: Vec<Track>,
    pub beat_markers: Vec<BeatMarker>,
    pub duration: Seconds,
    pub display_duration: Seconds,
    pub zoom: Zoom,
}

/// The editable timeline.
#[derive(Debug, Clone)]
pub struct Timeline {
    config: TimelineConfig,
    pub(crate) tracks: Vec<Track>,
    beat_markers: Vec<BeatMarker>,
    zoom: Zoom,
    /// Cached; see [`Timeline::derived_duration`].
    duration: Seconds,
    /// Margin past the last clip currently included in `duration`.
    trailing_margin: Seconds,
}

impl Timeline {
    /// Create a timeline with one empty primary video track and one empty
    /// primary audio track.
    pub fn new(config: TimelineConfig) -> Self {
        Self::with_tracks(
            config,
            vec![
                Track::new_video("Video 1"),
                Track::new_audio("Music").with_volume(80),
            ],
        )
    }

    /// Create a timeline from existing tracks.
    pub fn with_tracks(config: TimelineConfig, tracks: Vec<Track>) -> Self {
        let mut timeline = Self {
            config,
            tracks,
            beat_markers: Vec::new(),
            zoom: Zoom::DEFAULT,
            duration: 0.0,
            trailing_margin: 0.0,
        };
        for track in &mut timeline.tracks {
            let id = track.id;
            for clip in &mut track.clips {
                clip.track_id = id;
            }
        }
        timeline.grow_duration();
        timeline
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: Uuid) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_mut(&mut self, id: Uuid) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(VibeClipError::TrackNotFound(id))
    }

    /// Tracks of one kind, in order.
    pub fn tracks_of_kind(&self, kind: TrackKind) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    /// First track of `kind`.
    pub fn primary_track(&self, kind: TrackKind) -> Option<&Track> {
        primary_track_id(&self.tracks, kind).and_then(|id| self.track(id))
    }

    /// Every clip on every track.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(Track::clip_count).sum()
    }

    /// Find a clip and the track holding it.
    pub fn find_clip(&self, id: Uuid) -> Option<(&Track, &Clip)> {
        self.tracks
            .iter()
            .find_map(|t| t.find_clip(id).map(|c| (t, c)))
    }

    pub fn beat_markers(&self) -> &[BeatMarker] {
        &self.beat_markers
    }

    /// Replace the beat markers supplied by music analysis.
    pub fn set_beat_markers(&mut self, markers: Vec<BeatMarker>) {
        self.beat_markers = markers.into_iter().filter(BeatMarker::is_valid).collect();
    }

    /// Cached duration.
    pub fn duration(&self) -> Seconds {
        self.duration
    }

    /// Latest clip end, zero when empty.
    pub fn content_end(&self) -> Seconds {
        self.tracks.iter().map(Track::end_time).fold(0.0, f64::max)
    }

    /// Duration computed from the clips and the trailing margin in force.
    pub fn derived_duration(&self) -> Seconds {
        if self.clip_count() == 0 {
            0.0
        } else {
            self.content_end() + self.trailing_margin
        }
    }

    /// Span the view should show.
    pub fn display_duration(&self) -> Seconds {
        display_duration(self.duration, &self.config)
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn set_zoom(&mut self, factor: f64) -> Zoom {
        self.zoom = Zoom::new(factor, &self.config);
        self.zoom
    }

    pub fn zoom_in(&mut self) -> Zoom {
        self.zoom = self.zoom.zoomed_in(&self.config);
        self.zoom
    }

    pub fn zoom_out(&mut self) -> Zoom {
        self.zoom = self.zoom.zoomed_out(&self.config);
        self.zoom
    }

    /// Current snap distance in seconds.
    pub fn snap_threshold(&self) -> Seconds {
        self.zoom.snap_threshold(&self.config)
    }

    /// Timeline time under a pixel offset.
    pub fn time_at_pixel(&self, x: f64) -> Seconds {
        self.zoom.time_at_pixel(x, &self.config)
    }

    fn snapping(&self) -> SnappingEngine {
        SnappingEngine::new(self.snap_threshold(), self.config.snap_tie_break)
    }

    fn snap_span(
        &self,
        kind: TrackKind,
        raw_time: Seconds,
        duration: Seconds,
    ) -> (TimeSpan, Option<SnapEdge>) {
        let beats = self
            .config
            .snap_to_beats
            .then_some(self.beat_markers.as_slice());
        let points = SnappingEngine::collect_snap_points(&self.tracks, kind, None, beats);
        let result = self.snapping().resolve(raw_time, duration, &points);
        (result.span, result.edge)
    }

    /// Validate a drop payload and place it at `raw_time`.
    pub fn place(&mut self, payload: &DropPayload, raw_time: Seconds) -> Result<Placement> {
        let raw_time = ensure_finite("rawTime", raw_time)?;
        match payload.validate()? {
            PlacementRequest::Create {
                kind,
                source_id,
                source,
            } => Ok(self.insert_clip(kind, source_id, source, raw_time)),
            PlacementRequest::Move {
                clip_id,
                track_hint,
            } => self.relocate(clip_id, track_hint, raw_time),
        }
    }

    /// Insert a new clip covering `source`, snapped near `raw_time`.
    pub fn insert_clip(
        &mut self,
        kind: TrackKind,
        source_id: String,
        source: TimeSpan,
        raw_time: Seconds,
    ) -> Placement {
        let (span, snapped) = self.snap_span(kind, raw_time, source.duration());
        let clip = Clip::placed(source_id, span, source);
        let clip_id = clip.id;
        let alloc = find_or_create_track(&mut self.tracks, clip, kind);
        self.grow_duration();

        info!(
            %clip_id,
            track_id = %alloc.track_id,
            start = span.start,
            end = span.end,
            ?snapped,
            "Clip inserted"
        );
        Placement {
            clip_id,
            track_id: alloc.track_id,
            span,
            snapped,
            created_track: alloc.created_track,
        }
    }

    /// Move a clip to a new position near `raw_time`.
    pub fn move_clip(&mut self, clip_id: Uuid, raw_time: Seconds) -> Result<Placement> {
        let raw_time = ensure_finite("rawTime", raw_time)?;
        self.relocate(clip_id, None, raw_time)
    }

    fn relocate(
        &mut self,
        clip_id: Uuid,
        track_hint: Option<Uuid>,
        raw_time: Seconds,
    ) -> Result<Placement> {
        let track_index = track_hint
            .and_then(|hint| {
                self.tracks
                    .iter()
                    .position(|t| t.id == hint && t.find_clip(clip_id).is_some())
            })
            .or_else(|| {
                self.tracks
                    .iter()
                    .position(|t| t.find_clip(clip_id).is_some())
            })
            .ok_or(VibeClipError::ClipNotFound(clip_id))?;

        let track = &mut self.tracks[track_index];
        if track.locked {
            return Err(VibeClipError::TrackLocked(track.id));
        }
        let kind = track.kind;
        let mut clip = track
            .remove_clip(clip_id)
            .ok_or(VibeClipError::ClipNotFound(clip_id))?;
        prune_empty_tracks(&mut self.tracks);

        let (span, snapped) = self.snap_span(kind, raw_time, clip.duration());
        clip.set_span(span);
        let alloc = find_or_create_track(&mut self.tracks, clip, kind);
        self.grow_duration();

        info!(
            %clip_id,
            track_id = %alloc.track_id,
            start = span.start,
            end = span.end,
            ?snapped,
            "Clip moved"
        );
        Ok(Placement {
            clip_id,
            track_id: alloc.track_id,
            span,
            snapped,
            created_track: alloc.created_track,
        })
    }

    /// Delete a clip from a track. Returns the removed clip.
    pub fn delete_clip(&mut self, track_id: Uuid, clip_id: Uuid) -> Result<Clip> {
        let track = self.track_mut(track_id)?;
        if track.locked {
            return Err(VibeClipError::TrackLocked(track_id));
        }
        let clip = track
            .remove_clip(clip_id)
            .ok_or(VibeClipError::ClipNotFound(clip_id))?;
        prune_empty_tracks(&mut self.tracks);

        self.trailing_margin = 0.0;
        self.duration = self.derived_duration();
        info!(%clip_id, %track_id, duration = self.duration, "Clip deleted");
        Ok(clip)
    }

    /// Toggle mute. Returns the new state.
    pub fn toggle_track_mute(&mut self, track_id: Uuid) -> Result<bool> {
        let track = self.track_mut(track_id)?;
        track.muted = !track.muted;
        debug!(%track_id, muted = track.muted, "Track mute toggled");
        Ok(track.muted)
    }

    /// Toggle lock. Returns the new state.
    pub fn toggle_track_lock(&mut self, track_id: Uuid) -> Result<bool> {
        let track = self.track_mut(track_id)?;
        track.locked = !track.locked;
        debug!(%track_id, locked = track.locked, "Track lock toggled");
        Ok(track.locked)
    }

    /// Set track volume, clamped to 0..=100. Returns the applied volume.
    pub fn set_track_volume(&mut self, track_id: Uuid, volume: u8) -> Result<u8> {
        let track = self.track_mut(track_id)?;
        track.volume = volume.min(100);
        Ok(track.volume)
    }

    /// Re-derive the duration after a placement, taking on the trailing margin
    /// when the timeline grew past its previous duration.
    fn grow_duration(&mut self) {
        if self.content_end() > self.duration || self.duration == 0.0 {
            self.trailing_margin = self.config.duration_padding;
        }
        self.duration = self.derived_duration();
    }

    /// Check every invariant.
    pub fn verify(&self) -> Result<()> {
        for track in &self.tracks {
            for (i, clip) in track.clips.iter().enumerate() {
                if !clip.span().is_valid() {
                    return Err(VibeClipError::InvariantViolation(format!(
                        "Clip {} has an empty or non-finite span [{}, {})",
                        clip.id, clip.start_time, clip.end_time
                    )));
                }
                if (clip.source_span().duration() - clip.duration()).abs() > length_tolerance(clip) {
                    return Err(VibeClipError::InvariantViolation(format!(
                        "Clip {} source length {} differs from timeline length {}",
                        clip.id,
                        clip.source_span().duration(),
                        clip.duration()
                    )));
                }
                if clip.track_id != track.id {
                    return Err(VibeClipError::InvariantViolation(format!(
                        "Clip {} claims track {} but sits on {}",
                        clip.id, clip.track_id, track.id
                    )));
                }
                if let Some(other) = track.clips[i + 1..].iter().find(|o| o.overlaps(clip)) {
                    return Err(VibeClipError::InvariantViolation(format!(
                        "Clips {} and {} overlap on track {}",
                        clip.id, other.id, track.id
                    )));
                }
            }
        }

        let derived = self.derived_duration();
        if self.duration != derived {
            return Err(VibeClipError::InvariantViolation(format!(
                "Cached duration {} differs from derived {}",
                self.duration, derived
            )));
        }
        Ok(())
    }

    /// Immutable copy for observers.
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            tracks: self.tracks.clone(),
            beat_markers: self.beat_markers.clone(),
            duration: self.duration,
            display_duration: self.display_duration(),
            zoom: self.zoom,
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(TimelineConfig::default())
    }
}
