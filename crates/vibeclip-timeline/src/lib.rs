//! VibeClip Timeline - timeline model and placement resolver
//!
//! Implements the editable multi-track timeline:
//! - Tracks of video, audio, subtitle and effect clips
//! - Magnetic snapping of dropped clips to clip edges, zero and beats
//! - Automatic track allocation and cleanup of emptied tracks
//! - Atomic edit commands with invariant verification

pub mod clip;
pub mod edit;
pub mod marker;
pub mod payload;
pub mod placement;
pub mod timeline;
pub mod track;
pub mod viewport;

pub use clip::{Clip, Transition, TransitionKind};
pub use edit::{EditOutcome, TimelineCommand};
pub use marker::BeatMarker;
pub use payload::{DropPayload, DurationValue, PlacementRequest};
pub use placement::{
    find_or_create_track, primary_track_id, prune_empty_tracks, Allocation, SnapEdge, SnapPoints,
    SnapResult, SnappingEngine,
};
pub use timeline::{Placement, Timeline, TimelineSnapshot};
pub use track::{Track, TrackKind};
pub use viewport::{display_duration, Zoom};
