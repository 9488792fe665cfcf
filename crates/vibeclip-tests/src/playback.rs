//! Integration tests for playback synchronization.
//!
//! Drives an editor session with in-memory handles and a synthetic clock,
//! the way a browser would deliver progress, ready and error callbacks.

use std::time::{Duration, Instant};

use vibeclip_core::EditorConfig;
use vibeclip_playback::{
    EditorSession, InMemoryRegistry, MediaAsset, MediaKind, MemoryHandle, PlaybackHandle,
    SyncState,
};
use vibeclip_timeline::{DropPayload, Placement, TrackKind};

type Session = EditorSession<MemoryHandle, InMemoryRegistry>;

// ── Helpers ────────────────────────────────────────────────────

fn asset(id: &str, duration: f64) -> MediaAsset {
    MediaAsset {
        id: id.into(),
        path: format!("/media/{id}.mp4"),
        duration,
        width: 1920,
        height: 1080,
    }
}

fn session() -> Session {
    EditorSession::new(
        EditorConfig::default(),
        MemoryHandle::new("video"),
        MemoryHandle::new("audio"),
        InMemoryRegistry::from_assets([asset("A", 5.0), asset("B", 10.0), asset("C", 8.0)]),
    )
}

fn shot(session: &mut Session, source: &str, range: (f64, f64), at: f64, now: Instant) -> Placement {
    session
        .insert_clip(
            DropPayload::ExistingShot {
                source_id: source.into(),
                source_start: range.0,
                source_end: range.1,
                duration: range.1 - range.0,
            },
            at,
            now,
        )
        .unwrap()
}

/// Simulated wall clock driving the session like a render loop.
struct Clock {
    now: Instant,
}

impl Clock {
    fn new() -> Self {
        Self {
            now: Instant::now(),
        }
    }

    /// Advance in 20 ms slices, delivering progress, ready and tick.
    fn run(&mut self, session: &mut Session, seconds: f64) {
        let slices = (seconds / 0.02).round() as usize;
        for _ in 0..slices {
            self.now += Duration::from_millis(20);
            for kind in MediaKind::ALL {
                let handle = session.handle_mut(kind);
                if handle.is_paused() || handle.source().is_none() {
                    continue;
                }
                let native = handle.advance(0.02);
                session.on_progress(kind, native, self.now);
            }
            self.ready(session);
            session.tick(self.now);
        }
    }

    fn ready(&self, session: &mut Session) {
        for kind in MediaKind::ALL {
            if let Some(source) = session.handle_mut(kind).take_ready() {
                session.on_ready(kind, &source, self.now);
            }
        }
    }
}

// ── Hand-off ───────────────────────────────────────────────────

#[test]
fn boundary_hand_off_switches_source() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    shot(&mut session, "B", (2.0, 6.0), 5.0, clock.now);
    clock.ready(&mut session);

    session.set_playing(true, clock.now);
    clock.run(&mut session, 0.2);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Playing);

    // Native A at 4.96 is inside the guard band before the boundary at 5.0
    session.handle_mut(MediaKind::Video).seek(4.96);
    session.on_progress(MediaKind::Video, 4.96, clock.now);

    assert_eq!(session.cursor().timeline_time, 5.0);
    let video = session.engine().handle(MediaKind::Video);
    assert_eq!(video.source(), Some("/media/B.mp4"));
    assert_eq!(video.current_time(), 2.0);
    assert!(session.cursor().is_playing);
}

#[test]
fn plays_across_sources_to_the_end() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    shot(&mut session, "B", (2.0, 6.0), 5.0, clock.now);
    shot(&mut session, "A", (1.0, 3.0), 9.0, clock.now);
    clock.ready(&mut session);

    session.set_playing(true, clock.now);
    clock.run(&mut session, 13.0);

    let cursor = session.cursor();
    assert!(!cursor.is_playing);
    assert_eq!(cursor.timeline_time, 11.0);
    let loads = session.engine().handle(MediaKind::Video).loads();
    assert_eq!(
        loads,
        [
            "/media/A.mp4".to_string(),
            "/media/B.mp4".to_string(),
            "/media/A.mp4".to_string()
        ]
    );
}

#[test]
fn hand_off_jumps_gap_to_next_clip() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    shot(&mut session, "C", (0.0, 4.0), 8.0, clock.now);
    clock.ready(&mut session);

    session.set_playing(true, clock.now);
    clock.run(&mut session, 0.2);
    session.handle_mut(MediaKind::Video).seek(4.97);
    session.on_progress(MediaKind::Video, 4.97, clock.now);

    assert_eq!(session.cursor().timeline_time, 8.0);
    assert_eq!(
        session.engine().handle(MediaKind::Video).source(),
        Some("/media/C.mp4")
    );
}

// ── Seek & edits ───────────────────────────────────────────────

#[test]
fn seek_suppresses_then_settles() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    shot(&mut session, "B", (2.0, 6.0), 5.0, clock.now);
    clock.ready(&mut session);
    session.set_playing(true, clock.now);
    clock.run(&mut session, 0.2);

    session.seek(7.5, clock.now);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Seeking);
    // Stale progress from the old source is ignored
    session.on_progress(MediaKind::Video, 0.3, clock.now);
    assert_eq!(session.cursor().timeline_time, 7.5);
    assert_eq!(session.engine().handle(MediaKind::Video).current_time(), 4.5);

    clock.run(&mut session, 0.2);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Playing);
    assert!(session.cursor().timeline_time > 7.5);
}

#[test]
fn seek_supersedes_in_flight_hand_off() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    shot(&mut session, "B", (2.0, 6.0), 5.0, clock.now);
    clock.ready(&mut session);
    session.set_playing(true, clock.now);
    clock.run(&mut session, 0.2);

    let hand_off_at = clock.now;
    session.handle_mut(MediaKind::Video).seek(4.96);
    session.on_progress(MediaKind::Video, 4.96, hand_off_at);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Transitioning);
    assert_eq!(
        session.engine().settle_deadline(MediaKind::Video),
        Some(hand_off_at + Duration::from_millis(50))
    );

    // Seek back before B reported ready or its window passed
    let seek_at = hand_off_at + Duration::from_millis(10);
    session.seek(1.0, seek_at);

    let engine = session.engine();
    assert_eq!(engine.state(MediaKind::Video), SyncState::Seeking);
    assert_eq!(
        engine.settle_deadline(MediaKind::Video),
        Some(seek_at + Duration::from_millis(100))
    );
    let video = engine.handle(MediaKind::Video);
    assert_eq!(video.source(), Some("/media/A.mp4"));
    assert_eq!(video.current_time(), 1.0);
    assert_eq!(session.cursor().timeline_time, 1.0);
    assert!(session.cursor().is_playing);

    // B's late ready does not release the seek
    session.on_ready(MediaKind::Video, "/media/B.mp4", seek_at + Duration::from_millis(200));
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Seeking);

    clock.now = seek_at;
    clock.run(&mut session, 0.2);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Playing);
    assert!(session.cursor().timeline_time > 1.0);
    assert!(session.cursor().timeline_time < 1.5);
}

#[test]
fn placement_during_seek_retargets_handle() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    clock.ready(&mut session);

    // The cursor lands in the trailing margin past A
    session.seek(7.0, clock.now);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Seeking);
    assert_eq!(session.engine().handle(MediaKind::Video).source(), None);
    let deadline = session.engine().settle_deadline(MediaKind::Video);

    let placed = shot(&mut session, "C", (0.0, 4.0), 6.0, clock.now);
    assert_eq!(placed.span.start, 6.0);

    let engine = session.engine();
    assert_eq!(engine.state(MediaKind::Video), SyncState::Seeking);
    assert_eq!(engine.settle_deadline(MediaKind::Video), deadline);
    assert_eq!(engine.attached_clip(MediaKind::Video), Some(placed.clip_id));
    let video = engine.handle(MediaKind::Video);
    assert_eq!(video.source(), Some("/media/C.mp4"));
    assert_eq!(video.current_time(), 1.0);
    assert_eq!(session.cursor().timeline_time, 7.0);

    clock.run(&mut session, 0.2);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Paused);
}

#[test]
fn moving_the_playing_clip_resyncs_handle() {
    let mut session = session();
    let mut clock = Clock::new();
    let placed = shot(&mut session, "B", (0.0, 10.0), 0.0, clock.now);
    clock.ready(&mut session);
    session.seek(3.0, clock.now);
    clock.run(&mut session, 0.2);
    assert_eq!(session.engine().handle(MediaKind::Video).current_time(), 3.0);

    // The clip now starts at 2: timeline 3.0 is source 1.0
    session.move_clip(placed.clip_id, 2.0, clock.now).unwrap();
    assert_eq!(session.cursor().timeline_time, 3.0);
    assert_eq!(session.engine().handle(MediaKind::Video).current_time(), 1.0);
}

#[test]
fn deleting_everything_stops_cleanly() {
    let mut session = session();
    let mut clock = Clock::new();
    let placed = shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    clock.ready(&mut session);
    session.set_playing(true, clock.now);
    clock.run(&mut session, 1.0);

    session
        .delete_clip(placed.track_id, placed.clip_id, clock.now)
        .unwrap();
    assert_eq!(session.cursor().timeline_time, 0.0);
    assert_eq!(session.engine().handle(MediaKind::Video).source(), None);
    assert_eq!(session.timeline().duration(), 0.0);
}

// ── Audio & failures ───────────────────────────────────────────

#[test]
fn audio_follows_master_time_with_volume() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "B", (0.0, 10.0), 0.0, clock.now);
    session
        .insert_clip_json(
            r#"{"type":"audio-asset","sourceId":"/music/calm.mp3","duration":"0:20"}"#,
            2.0,
            clock.now,
        )
        .unwrap();
    session.set_volume(50);
    clock.ready(&mut session);

    session.set_playing(true, clock.now);
    clock.run(&mut session, 3.0);

    let audio = session.engine().handle(MediaKind::Audio);
    assert_eq!(audio.source(), Some("/music/calm.mp3"));
    let expected = session.cursor().timeline_time - 2.0;
    assert!((audio.current_time() - expected).abs() <= 0.2);
    // Master 50 scaled by the music track's 80
    assert!((audio.volume() - 0.4).abs() < 1e-6);

    let music = session.timeline().primary_track(TrackKind::Audio).unwrap().id;
    session.toggle_track_mute(music, clock.now);
    assert_eq!(session.engine().handle(MediaKind::Audio).volume(), 0.0);
}

#[test]
fn missing_video_source_lets_audio_continue() {
    let mut session = session();
    let mut clock = Clock::new();
    session
        .insert_clip(
            DropPayload::NewMedia {
                source_id: "not-in-library".into(),
                duration: 6.0,
            },
            0.0,
            clock.now,
        )
        .unwrap();
    session
        .insert_clip_json(
            r#"{"type":"audio-asset","sourceId":"/music/calm.mp3","duration":4}"#,
            0.0,
            clock.now,
        )
        .unwrap();
    clock.ready(&mut session);

    session.set_playing(true, clock.now);
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Idle);
    clock.run(&mut session, 2.0);

    let cursor = session.cursor();
    assert!(cursor.is_playing);
    assert!((cursor.timeline_time - 2.0).abs() < 0.05);
    assert!(!session.engine().handle(MediaKind::Audio).is_paused());

    clock.run(&mut session, 5.0);
    assert!(!session.cursor().is_playing);
    assert_eq!(session.cursor().timeline_time, 6.0);
}

#[test]
fn handle_error_mid_clip_recovers_on_next_clip() {
    let mut session = session();
    let mut clock = Clock::new();
    shot(&mut session, "A", (0.0, 5.0), 0.0, clock.now);
    shot(&mut session, "C", (0.0, 3.0), 5.0, clock.now);
    clock.ready(&mut session);
    session.set_playing(true, clock.now);
    clock.run(&mut session, 1.0);

    session.on_error(MediaKind::Video, "network error");
    assert_eq!(session.engine().state(MediaKind::Video), SyncState::Idle);

    // The master clock runs through the failed clip, then C attaches
    clock.run(&mut session, 4.5);
    assert_eq!(
        session.engine().handle(MediaKind::Video).source(),
        Some("/media/C.mp4")
    );
    assert!(session.cursor().is_playing);
}
