//! Playback synchronization engine.
//!
//! Keeps one handle per media kind positioned on the primary track of that
//! kind. Master time follows the video handle's native progress; when a
//! video clip ends the engine hands off to the next clip, and when there is
//! no video to follow it runs its own clock from `tick`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;
use vibeclip_core::{PlaybackConfig, Seconds};
use vibeclip_timeline::{Clip, Timeline, Track, TrackKind};

use crate::handle::PlaybackHandle;
use crate::lookup::{find_clip_at_time, find_next_clip};
use crate::registry::MediaRegistry;
use crate::state::{SyncEvent, SyncState, TrackSync};

/// Media kinds that get a playback handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    pub const ALL: [MediaKind; 2] = [MediaKind::Video, MediaKind::Audio];

    pub fn track_kind(self) -> TrackKind {
        match self {
            Self::Video => TrackKind::Video,
            Self::Audio => TrackKind::Audio,
        }
    }
}

/// The virtual play-head.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackCursor {
    pub timeline_time: Seconds,
    pub is_playing: bool,
}

/// How hard a sync pass corrects handle positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Regular follow-up: drift-correct audio and paused video, never a
    /// handle that is still settling.
    Follow,
    /// After an edit or a play/pause change: drift-correct every handle.
    Reconcile,
    /// After a seek: position every handle unconditionally.
    Reposition,
}

struct SyncContext<'a> {
    time: Seconds,
    playing: bool,
    now: Instant,
    mode: SyncMode,
    volume: f32,
    config: &'a PlaybackConfig,
}

/// A handle together with its sync bookkeeping.
#[derive(Debug)]
struct Channel<H> {
    kind: MediaKind,
    handle: H,
    sync: TrackSync,
}

impl<H: PlaybackHandle> Channel<H> {
    fn new(kind: MediaKind, handle: H) -> Self {
        Self {
            kind,
            handle,
            sync: TrackSync::new(),
        }
    }

    fn reconcile(&mut self, clips: &[&Clip], registry: &dyn MediaRegistry, ctx: &SyncContext<'_>) {
        self.handle.set_volume(ctx.volume);

        let target = find_clip_at_time(ctx.time, clips, ctx.config.end_epsilon);
        if let (Some(failed), Some(clip)) = (self.sync.failed_clip, target) {
            if failed != clip.id {
                self.sync.failed_clip = None;
            }
        }
        let Some(clip) = target.filter(|c| Some(c.id) != self.sync.failed_clip) else {
            self.detach();
            return;
        };

        let source = match registry.playable_source(self.kind, &clip.source_id) {
            Ok(source) => source,
            Err(e) => {
                warn!(kind = ?self.kind, clip_id = %clip.id, error = %e, "Track idle");
                self.fail(clip.id);
                return;
            }
        };

        let expected = clip
            .source_time_at(ctx.time)
            .clamp(clip.source_start, clip.source_end);
        if self.sync.clip_id != Some(clip.id) || self.handle.source() != Some(source.as_str()) {
            self.attach(clip, &source, expected, ctx);
        } else {
            self.correct(expected, ctx);
        }

        if let Err(e) = self.align_play_state(ctx.playing) {
            warn!(kind = ?self.kind, clip_id = %clip.id, error = %e, "Handle failed to play, track idle");
            self.fail(clip.id);
        }
    }

    fn attach(&mut self, clip: &Clip, source: &str, expected: Seconds, ctx: &SyncContext<'_>) {
        if self.handle.source() != Some(source) {
            self.handle.load(source);
            self.sync.ready = false;
        }
        self.handle.seek(expected);
        self.sync.clip_id = Some(clip.id);
        self.sync.suppress(
            SyncEvent::HandOffStarted,
            ctx.now + ctx.config.transition_settle(),
        );
        debug!(
            kind = ?self.kind,
            clip_id = %clip.id,
            source,
            source_time = expected,
            "Attached clip"
        );
    }

    fn correct(&mut self, expected: Seconds, ctx: &SyncContext<'_>) {
        let check = match ctx.mode {
            SyncMode::Reposition => {
                self.handle.seek(expected);
                return;
            }
            SyncMode::Reconcile => true,
            SyncMode::Follow => {
                !self.sync.state.suppresses_feedback()
                    && (self.kind == MediaKind::Audio || self.handle.is_paused())
            }
        };

        let drift = (self.handle.current_time() - expected).abs();
        if check && drift > ctx.config.drift_tolerance {
            debug!(kind = ?self.kind, drift, expected, "Correcting drift");
            self.handle.seek(expected);
        }
    }

    fn align_play_state(&mut self, playing: bool) -> vibeclip_core::Result<()> {
        if playing && self.handle.is_paused() {
            self.handle.play()?;
            self.sync.state = self.sync.state.on(SyncEvent::PlayRequested);
        } else if !playing && !self.handle.is_paused() {
            self.handle.pause();
            self.sync.state = self.sync.state.on(SyncEvent::PauseRequested);
        }
        Ok(())
    }

    fn detach(&mut self) {
        if self.sync.clip_id.is_none() && self.handle.source().is_none() {
            return;
        }
        debug!(kind = ?self.kind, "Detached, no clip under cursor");
        self.handle.pause();
        self.handle.unload();
        self.sync.clip_id = None;
        self.sync.ready = true;
        self.sync.state = self.sync.state.on(SyncEvent::Detached);
    }

    fn fail(&mut self, clip_id: Uuid) {
        self.handle.pause();
        self.handle.unload();
        self.sync.fail(clip_id);
    }

    fn stop(&mut self) {
        self.handle.pause();
        self.sync.state = self.sync.state.on(SyncEvent::Ended);
    }
}

/// Drives the video and audio handles from the timeline and the cursor.
#[derive(Debug)]
pub struct PlaybackEngine<H> {
    config: PlaybackConfig,
    cursor: PlaybackCursor,
    video: Channel<H>,
    audio: Channel<H>,
    /// Master volume, 0..=100
    volume: u8,
    muted: bool,
    last_tick: Option<Instant>,
}

impl<H: PlaybackHandle> PlaybackEngine<H> {
    pub fn new(config: PlaybackConfig, video: H, audio: H) -> Self {
        let volume = config.default_volume.min(100);
        Self {
            config,
            cursor: PlaybackCursor::default(),
            video: Channel::new(MediaKind::Video, video),
            audio: Channel::new(MediaKind::Audio, audio),
            volume,
            muted: false,
            last_tick: None,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn state(&self, kind: MediaKind) -> SyncState {
        self.channel(kind).sync.state
    }

    /// Clip the handle of `kind` is positioned on.
    pub fn attached_clip(&self, kind: MediaKind) -> Option<Uuid> {
        self.channel(kind).sync.clip_id
    }

    /// When the suppression on `kind` may be released, if it is settling.
    pub fn settle_deadline(&self, kind: MediaKind) -> Option<Instant> {
        self.channel(kind).sync.settle_at()
    }

    pub fn handle(&self, kind: MediaKind) -> &H {
        &self.channel(kind).handle
    }

    pub fn handle_mut(&mut self, kind: MediaKind) -> &mut H {
        &mut self.channel_mut(kind).handle
    }

    fn channel(&self, kind: MediaKind) -> &Channel<H> {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }

    fn channel_mut(&mut self, kind: MediaKind) -> &mut Channel<H> {
        match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
        }
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Set master volume (clamped to 0..=100) and apply it to both handles.
    pub fn set_volume(&mut self, volume: u8, timeline: &Timeline) {
        self.volume = volume.min(100);
        self.apply_volumes(timeline);
    }

    pub fn set_muted(&mut self, muted: bool, timeline: &Timeline) {
        self.muted = muted;
        self.apply_volumes(timeline);
    }

    /// Handle volume for a track: master volume scaled by track volume,
    /// silent when either is muted.
    fn volume_for(&self, track: Option<&Track>) -> f32 {
        if self.muted || track.is_some_and(|t| t.muted) {
            return 0.0;
        }
        let track_volume = track.map_or(100, |t| t.volume.min(100));
        (self.volume as f32 / 100.0) * (track_volume as f32 / 100.0)
    }

    fn apply_volumes(&mut self, timeline: &Timeline) {
        for kind in MediaKind::ALL {
            let volume = self.volume_for(timeline.primary_track(kind.track_kind()));
            self.channel_mut(kind).handle.set_volume(volume);
        }
    }

    /// Keep the cursor inside `[0, duration]` after the timeline changed.
    pub fn clamp_cursor(&mut self, duration: Seconds) {
        self.cursor.timeline_time = self.cursor.timeline_time.clamp(0.0, duration.max(0.0));
    }

    /// Start or stop playback.
    ///
    /// Starting at or past the end of the content rewinds to zero. Starting an
    /// empty timeline does nothing.
    pub fn set_playing(
        &mut self,
        playing: bool,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
        now: Instant,
    ) {
        if playing == self.cursor.is_playing {
            return;
        }
        if playing {
            if timeline.clip_count() == 0 {
                debug!("Nothing to play");
                return;
            }
            if self.cursor.timeline_time >= timeline.content_end() {
                self.cursor.timeline_time = 0.0;
            }
        }

        self.cursor.is_playing = playing;
        self.last_tick = Some(now);
        info!(playing, at = self.cursor.timeline_time, "Playback toggled");
        self.sync(timeline, registry, now, SyncMode::Reconcile);
    }

    /// Jump to `time`, clamped to `[0, duration]`. Non-finite times are ignored.
    pub fn seek(
        &mut self,
        time: Seconds,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
        now: Instant,
    ) {
        if !time.is_finite() {
            warn!(time, "Ignoring non-finite seek");
            return;
        }
        let target = time.clamp(0.0, timeline.duration().max(0.0));
        self.cursor.timeline_time = target;

        let until = now + self.config.seek_settle();
        for kind in MediaKind::ALL {
            let channel = self.channel_mut(kind);
            channel.sync.failed_clip = None;
            channel.sync.suppress(SyncEvent::SeekStarted, until);
        }
        debug!(requested = time, target, "Seeking");
        self.sync(timeline, registry, now, SyncMode::Reposition);
    }

    /// Bring both handles in line with the cursor.
    pub fn sync(
        &mut self,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
        now: Instant,
        mode: SyncMode,
    ) {
        for kind in MediaKind::ALL {
            self.sync_channel(kind, timeline, registry, now, mode);
        }
    }

    fn sync_channel(
        &mut self,
        kind: MediaKind,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
        now: Instant,
        mode: SyncMode,
    ) {
        let track = timeline.primary_track(kind.track_kind());
        let clips = track.map(Track::sorted_clips).unwrap_or_default();
        let volume = self.volume_for(track);
        let ctx = SyncContext {
            time: self.cursor.timeline_time,
            playing: self.cursor.is_playing,
            now,
            mode,
            volume,
            config: &self.config,
        };
        let channel = match kind {
            MediaKind::Video => &mut self.video,
            MediaKind::Audio => &mut self.audio,
        };

        channel.reconcile(&clips, registry, &ctx);
    }

    /// Native progress reported by a handle, in source seconds.
    pub fn on_progress(
        &mut self,
        kind: MediaKind,
        native_time: Seconds,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
        now: Instant,
    ) {
        if !native_time.is_finite() {
            return;
        }
        if self.channel(kind).sync.state.suppresses_feedback() {
            trace!(?kind, native_time, "Progress ignored while settling");
            return;
        }
        match kind {
            MediaKind::Video => self.follow_video(native_time, timeline, registry, now),
            MediaKind::Audio => {
                self.sync_channel(MediaKind::Audio, timeline, registry, now, SyncMode::Follow)
            }
        }
    }

    fn follow_video(
        &mut self,
        native_time: Seconds,
        timeline: &Timeline,
        registry: &dyn MediaRegistry,
        now: Instant,
    ) {
        if !self.cursor.is_playing {
            return;
        }
        let Some(clip_id) = self.video.sync.clip_id else {
            return;
        };
        let Some(track) = timeline.primary_track(TrackKind::Video) else {
            return;
        };
        let Some(clip) = track.find_clip(clip_id) else {
            self.sync(timeline, registry, now, SyncMode::Reconcile);
            return;
        };

        let derived = clip.timeline_time_at(native_time);
        if derived < clip.end_time - self.config.boundary_guard {
            self.cursor.timeline_time = derived.clamp(clip.start_time, clip.end_time);
            self.sync_channel(MediaKind::Audio, timeline, registry, now, SyncMode::Follow);
            return;
        }

        let clips = track.sorted_clips();
        match find_next_clip(clip.end_time, &clips) {
            Some(next) => {
                info!(from = %clip.id, to = %next.id, at = next.start_time, "Handing off to next clip");
                self.cursor.timeline_time = next.start_time;
                self.sync(timeline, registry, now, SyncMode::Follow);
            }
            None => self.finish(clip.end_time),
        }
    }

    fn finish(&mut self, at: Seconds) {
        info!(at, "Reached end of timeline");
        self.cursor.timeline_time = at;
        self.cursor.is_playing = false;
        self.video.stop();
        self.audio.stop();
    }

    /// The handle of `kind` finished loading `source`. Signals for a source
    /// the handle has since moved away from are ignored.
    pub fn on_ready(&mut self, kind: MediaKind, source: &str, now: Instant) {
        let playing = self.cursor.is_playing;
        let channel = self.channel_mut(kind);
        if channel.handle.source() != Some(source) {
            debug!(?kind, source, "Stale ready signal ignored");
            return;
        }
        channel.sync.ready = true;
        if channel.sync.try_settle(now, playing) {
            debug!(?kind, state = ?channel.sync.state, "Track settled");
        }
    }

    /// The handle of `kind` reported an error. The track goes idle; the
    /// other track and the master clock continue.
    pub fn on_error(&mut self, kind: MediaKind, message: &str) {
        let channel = self.channel_mut(kind);
        match channel.sync.clip_id {
            Some(clip_id) => {
                warn!(?kind, %clip_id, error = message, "Playback handle failed, track idle");
                channel.fail(clip_id);
            }
            None => warn!(?kind, error = message, "Playback handle error with no clip attached"),
        }
    }

    /// Periodic housekeeping: release settled tracks and, while nothing
    /// drives master time, advance it by the elapsed wall time.
    pub fn tick(&mut self, now: Instant, timeline: &Timeline, registry: &dyn MediaRegistry) {
        let elapsed = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);

        let playing = self.cursor.is_playing;
        for kind in MediaKind::ALL {
            let channel = self.channel_mut(kind);
            if channel.sync.try_settle(now, playing) {
                debug!(?kind, state = ?channel.sync.state, "Track settled");
            }
        }

        if !playing || self.video.sync.state != SyncState::Idle {
            return;
        }
        let end = timeline.content_end();
        let next = self.cursor.timeline_time + elapsed.as_secs_f64();
        if next >= end {
            self.finish(self.cursor.timeline_time.max(end));
        } else {
            self.cursor.timeline_time = next;
            self.sync(timeline, registry, now, SyncMode::Follow);
        }
    }
}
