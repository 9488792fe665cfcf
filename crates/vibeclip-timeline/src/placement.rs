//! Placement resolver: magnetic snapping and track allocation.
//!
//! A drop goes through two steps. The snapping engine turns the raw drop time
//! into a span, aligning either edge with a nearby clip boundary or zero. Track
//! allocation then finds the first track of the right kind where that span
//! fits, appending a new track after the last one of that kind if none does.

use smallvec::SmallVec;
use tracing::debug;
use uuid::Uuid;
use vibeclip_core::{Seconds, SnapTieBreak, TimeSpan};

use crate::clip::Clip;
use crate::marker::BeatMarker;
use crate::track::{Track, TrackKind};

/// Which edge of the dropped clip was aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapEdge {
    Start,
    End,
}

/// Outcome of snapping a drop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    pub span: TimeSpan,
    pub edge: Option<SnapEdge>,
}

/// Times a drop can snap to, in priority order.
pub type SnapPoints = SmallVec<[Seconds; 16]>;

/// Engine for computing snap targets.
#[derive(Debug, Clone, Copy)]
pub struct SnappingEngine {
    /// Snap distance in timeline seconds.
    pub threshold: Seconds,
    pub tie_break: SnapTieBreak,
}

impl SnappingEngine {
    pub fn new(threshold: Seconds, tie_break: SnapTieBreak) -> Self {
        Self {
            threshold,
            tie_break,
        }
    }

    /// Collect snap points: zero, then both edges of every clip on tracks of
    /// `kind` (track order, then clip insertion order), then beats if given.
    pub fn collect_snap_points(
        tracks: &[Track],
        kind: TrackKind,
        exclude_clip: Option<Uuid>,
        beats: Option<&[BeatMarker]>,
    ) -> SnapPoints {
        let mut points = SnapPoints::new();
        points.push(0.0);

        for track in tracks.iter().filter(|t| t.kind == kind) {
            for clip in track.clips.iter().filter(|c| Some(c.id) != exclude_clip) {
                points.push(clip.start_time);
                points.push(clip.end_time);
            }
        }

        points.extend(
            beats
                .into_iter()
                .flatten()
                .filter(|b| b.is_valid())
                .map(|b| b.timestamp),
        );

        points
    }

    /// Find a snap point strictly within the threshold of `time` that also
    /// satisfies `allowed`.
    pub fn find_snap(
        &self,
        time: Seconds,
        points: &[Seconds],
        allowed: impl Fn(Seconds) -> bool,
    ) -> Option<Seconds> {
        let mut candidates = points
            .iter()
            .map(|&p| (p, (p - time).abs()))
            .filter(|&(t, dist)| dist < self.threshold && allowed(t));

        match self.tie_break {
            SnapTieBreak::FirstMatch => candidates.next().map(|(t, _)| t),
            SnapTieBreak::Nearest => candidates
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(t, _)| t),
        }
    }

    /// Resolve where a clip of `duration` dropped at `raw` lands.
    ///
    /// The start edge is tried first, then the end edge. An end snap that would
    /// push the start below zero is not taken. Without a snap the raw time is
    /// used, clamped to zero.
    pub fn resolve(&self, raw: Seconds, duration: Seconds, points: &[Seconds]) -> SnapResult {
        if let Some(start) = self.find_snap(raw, points, |_| true) {
            return SnapResult {
                span: TimeSpan::from_start_duration(start, duration),
                edge: Some(SnapEdge::Start),
            };
        }

        if let Some(end) = self.find_snap(raw + duration, points, |p| p - duration >= 0.0) {
            return SnapResult {
                span: TimeSpan::new(end - duration, end),
                edge: Some(SnapEdge::End),
            };
        }

        SnapResult {
            span: TimeSpan::from_start_duration(raw.max(0.0), duration),
            edge: None,
        }
    }
}

/// Where allocation put a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub track_id: Uuid,
    pub created_track: bool,
}

/// Put `clip` on the first track of `kind` that accepts its span, or on a new
/// track inserted right after the last track of that kind.
pub fn find_or_create_track(tracks: &mut Vec<Track>, clip: Clip, kind: TrackKind) -> Allocation {
    let span = clip.span();
    if let Some(track) = tracks
        .iter_mut()
        .filter(|t| t.kind == kind)
        .find(|t| t.accepts(span))
    {
        let track_id = track.id;
        track.push_clip(clip);
        return Allocation {
            track_id,
            created_track: false,
        };
    }

    let same_kind = tracks.iter().filter(|t| t.kind == kind).count();
    let mut track = Track::new(kind, format!("{} {}", kind.label(), same_kind + 1));
    let track_id = track.id;
    track.push_clip(clip);

    let index = tracks
        .iter()
        .rposition(|t| t.kind == kind)
        .map_or(tracks.len(), |last| last + 1);
    debug!(%track_id, ?kind, index, "Allocating new track");
    tracks.insert(index, track);

    Allocation {
        track_id,
        created_track: true,
    }
}

/// ID of the first track of `kind`, which is never removed automatically.
pub fn primary_track_id(tracks: &[Track], kind: TrackKind) -> Option<Uuid> {
    tracks.iter().find(|t| t.kind == kind).map(|t| t.id)
}

/// Remove empty tracks except the primary track of each kind. Returns the
/// removed track IDs.
pub fn prune_empty_tracks(tracks: &mut Vec<Track>) -> Vec<Uuid> {
    let primaries: SmallVec<[Uuid; 4]> = [
        TrackKind::Video,
        TrackKind::Audio,
        TrackKind::Subtitle,
        TrackKind::Effect,
    ]
    .into_iter()
    .filter_map(|kind| primary_track_id(tracks, kind))
    .collect();

    let mut removed = Vec::new();
    tracks.retain(|t| {
        let keep = !t.is_empty() || primaries.contains(&t.id);
        if !keep {
            removed.push(t.id);
        }
        keep
    });
    if !removed.is_empty() {
        debug!(count = removed.len(), "Pruned empty tracks");
    }
    removed
}
