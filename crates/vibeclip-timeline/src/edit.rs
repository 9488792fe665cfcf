//! Edit commands applied atomically to a timeline.
//!
//! Every mutation coming from the editor surface is a `TimelineCommand`.
//! [`Timeline::apply`] runs it, re-verifies the model, and restores the
//! previous state if anything failed, so a rejected edit never leaves a
//! half-applied timeline behind.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use vibeclip_core::{Result, Seconds};

use crate::clip::Clip;
use crate::marker::BeatMarker;
use crate::payload::DropPayload;
use crate::timeline::{Placement, Timeline};
use crate::viewport::Zoom;

/// A timeline edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum TimelineCommand {
    /// Drop a payload at a raw timeline time.
    #[serde(rename_all = "camelCase")]
    Place {
        payload: DropPayload,
        raw_time: Seconds,
    },
    /// Move an existing clip.
    #[serde(rename_all = "camelCase")]
    Move { clip_id: Uuid, raw_time: Seconds },
    /// Remove a clip from a track.
    #[serde(rename_all = "camelCase")]
    Delete { track_id: Uuid, clip_id: Uuid },
    #[serde(rename_all = "camelCase")]
    ToggleMute { track_id: Uuid },
    #[serde(rename_all = "camelCase")]
    ToggleLock { track_id: Uuid },
    #[serde(rename_all = "camelCase")]
    SetVolume { track_id: Uuid, volume: u8 },
    SetZoom { factor: f64 },
    SetBeatMarkers { markers: Vec<BeatMarker> },
}

impl TimelineCommand {
    fn name(&self) -> &'static str {
        match self {
            Self::Place { .. } => "place",
            Self::Move { .. } => "move",
            Self::Delete { .. } => "delete",
            Self::ToggleMute { .. } => "toggle-mute",
            Self::ToggleLock { .. } => "toggle-lock",
            Self::SetVolume { .. } => "set-volume",
            Self::SetZoom { .. } => "set-zoom",
            Self::SetBeatMarkers { .. } => "set-beat-markers",
        }
    }
}

/// What a successfully applied command did.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Placed(Placement),
    Deleted(Clip),
    Muted(bool),
    Locked(bool),
    Volume(u8),
    Zoomed(Zoom),
    MarkersSet(usize),
}

impl Timeline {
    /// Apply a command atomically.
    ///
    /// On any error, including an invariant violation detected after the
    /// command ran, the timeline is restored to its state before the call.
    pub fn apply(&mut self, command: TimelineCommand) -> Result<EditOutcome> {
        let before = self.clone();
        let name = command.name();

        let result = self
            .execute(command)
            .and_then(|outcome| self.verify().map(|()| outcome));

        if let Err(e) = &result {
            warn!(command = name, error = %e, "Edit rejected, timeline restored");
            *self = before;
        }
        result
    }

    fn execute(&mut self, command: TimelineCommand) -> Result<EditOutcome> {
        Ok(match command {
            TimelineCommand::Place { payload, raw_time } => {
                EditOutcome::Placed(self.place(&payload, raw_time)?)
            }
            TimelineCommand::Move { clip_id, raw_time } => {
                EditOutcome::Placed(self.move_clip(clip_id, raw_time)?)
            }
            TimelineCommand::Delete { track_id, clip_id } => {
                EditOutcome::Deleted(self.delete_clip(track_id, clip_id)?)
            }
            TimelineCommand::ToggleMute { track_id } => {
                EditOutcome::Muted(self.toggle_track_mute(track_id)?)
            }
            TimelineCommand::ToggleLock { track_id } => {
                EditOutcome::Locked(self.toggle_track_lock(track_id)?)
            }
            TimelineCommand::SetVolume { track_id, volume } => {
                EditOutcome::Volume(self.set_track_volume(track_id, volume)?)
            }
            TimelineCommand::SetZoom { factor } => EditOutcome::Zoomed(self.set_zoom(factor)),
            TimelineCommand::SetBeatMarkers { markers } => {
                self.set_beat_markers(markers);
                EditOutcome::MarkersSet(self.beat_markers().len())
            }
        })
    }
}
