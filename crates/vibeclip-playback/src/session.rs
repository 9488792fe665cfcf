//! Editor session: the single entry point for edits and playback control.
//!
//! The session owns the timeline, the playback engine and the media registry.
//! Every call runs to completion; errors from the model are logged and the
//! call becomes a no-op.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;
use vibeclip_core::{EditorConfig, Seconds};
use vibeclip_timeline::{
    BeatMarker, Clip, DropPayload, EditOutcome, Placement, Timeline, TimelineCommand,
    TimelineSnapshot, Zoom,
};

use crate::engine::{MediaKind, PlaybackCursor, PlaybackEngine, SyncMode};
use crate::handle::PlaybackHandle;
use crate::registry::MediaRegistry;
use crate::state::SyncState;

/// Immutable view handed to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub timeline: TimelineSnapshot,
    pub cursor: PlaybackCursor,
    pub video_state: SyncState,
    pub audio_state: SyncState,
}

pub struct EditorSession<H, R> {
    timeline: Timeline,
    engine: PlaybackEngine<H>,
    registry: R,
}

impl<H: PlaybackHandle, R: MediaRegistry> EditorSession<H, R> {
    pub fn new(config: EditorConfig, video: H, audio: H, registry: R) -> Self {
        Self {
            timeline: Timeline::new(config.timeline),
            engine: PlaybackEngine::new(config.playback, video, audio),
            registry,
        }
    }

    /// Wrap an existing timeline.
    pub fn with_timeline(
        timeline: Timeline,
        engine: PlaybackEngine<H>,
        registry: R,
    ) -> Self {
        Self {
            timeline,
            engine,
            registry,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn engine(&self) -> &PlaybackEngine<H> {
        &self.engine
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.engine.cursor()
    }

    pub fn handle_mut(&mut self, kind: MediaKind) -> &mut H {
        self.engine.handle_mut(kind)
    }

    /// Apply a timeline command, then clamp the cursor and reconcile playback.
    pub fn apply(&mut self, command: TimelineCommand, now: Instant) -> Option<EditOutcome> {
        let outcome = self.timeline.apply(command).ok()?;
        self.engine.clamp_cursor(self.timeline.duration());
        self.engine
            .sync(&self.timeline, &self.registry, now, SyncMode::Reconcile);
        Some(outcome)
    }

    fn place(&mut self, command: TimelineCommand, now: Instant) -> Option<Placement> {
        match self.apply(command, now)? {
            EditOutcome::Placed(placement) => Some(placement),
            _ => None,
        }
    }

    /// Drop a payload at a raw timeline time.
    pub fn insert_clip(
        &mut self,
        payload: DropPayload,
        raw_time: Seconds,
        now: Instant,
    ) -> Option<Placement> {
        self.place(TimelineCommand::Place { payload, raw_time }, now)
    }

    /// Drop a JSON payload, as delivered by a drag/drop event.
    pub fn insert_clip_json(
        &mut self,
        payload: &str,
        raw_time: Seconds,
        now: Instant,
    ) -> Option<Placement> {
        match DropPayload::from_json(payload) {
            Ok(payload) => self.insert_clip(payload, raw_time, now),
            Err(e) => {
                warn!(error = %e, "Drop ignored");
                None
            }
        }
    }

    pub fn move_clip(&mut self, clip_id: Uuid, raw_time: Seconds, now: Instant) -> Option<Placement> {
        self.place(TimelineCommand::Move { clip_id, raw_time }, now)
    }

    pub fn delete_clip(&mut self, track_id: Uuid, clip_id: Uuid, now: Instant) -> Option<Clip> {
        match self.apply(TimelineCommand::Delete { track_id, clip_id }, now)? {
            EditOutcome::Deleted(clip) => Some(clip),
            _ => None,
        }
    }

    pub fn toggle_track_mute(&mut self, track_id: Uuid, now: Instant) -> Option<bool> {
        match self.apply(TimelineCommand::ToggleMute { track_id }, now)? {
            EditOutcome::Muted(muted) => Some(muted),
            _ => None,
        }
    }

    pub fn toggle_track_lock(&mut self, track_id: Uuid, now: Instant) -> Option<bool> {
        match self.apply(TimelineCommand::ToggleLock { track_id }, now)? {
            EditOutcome::Locked(locked) => Some(locked),
            _ => None,
        }
    }

    pub fn set_track_volume(&mut self, track_id: Uuid, volume: u8, now: Instant) -> Option<u8> {
        match self.apply(TimelineCommand::SetVolume { track_id, volume }, now)? {
            EditOutcome::Volume(volume) => Some(volume),
            _ => None,
        }
    }

    pub fn set_zoom(&mut self, factor: f64) -> Zoom {
        self.timeline.set_zoom(factor)
    }

    pub fn set_beat_markers(&mut self, markers: Vec<BeatMarker>) {
        self.timeline.set_beat_markers(markers);
    }

    /// Master volume, 0..=100.
    pub fn set_volume(&mut self, volume: u8) {
        self.engine.set_volume(volume, &self.timeline);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.engine.set_muted(muted, &self.timeline);
    }

    pub fn set_playing(&mut self, playing: bool, now: Instant) {
        self.engine
            .set_playing(playing, &self.timeline, &self.registry, now);
    }

    pub fn toggle_playing(&mut self, now: Instant) {
        let playing = !self.engine.cursor().is_playing;
        self.set_playing(playing, now);
    }

    pub fn seek(&mut self, time: Seconds, now: Instant) {
        self.engine.seek(time, &self.timeline, &self.registry, now);
    }

    /// Native progress from a handle.
    pub fn on_progress(&mut self, kind: MediaKind, native_time: Seconds, now: Instant) {
        self.engine
            .on_progress(kind, native_time, &self.timeline, &self.registry, now);
    }

    /// A handle finished loading `source`.
    pub fn on_ready(&mut self, kind: MediaKind, source: &str, now: Instant) {
        self.engine.on_ready(kind, source, now);
    }

    pub fn on_error(&mut self, kind: MediaKind, message: &str) {
        self.engine.on_error(kind, message);
    }

    pub fn tick(&mut self, now: Instant) {
        self.engine.tick(now, &self.timeline, &self.registry);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            timeline: self.timeline.snapshot(),
            cursor: self.engine.cursor(),
            video_state: self.engine.state(MediaKind::Video),
            audio_state: self.engine.state(MediaKind::Audio),
        }
    }
}
