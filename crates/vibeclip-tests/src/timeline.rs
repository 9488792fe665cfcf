//! Integration tests for the timeline model and placement resolver.
//!
//! Exercises drop payloads coming in as JSON, through snapping and track
//! allocation, and checks the model invariants over random edit sequences.

use proptest::prelude::*;
use uuid::Uuid;
use vibeclip_core::{format_duration, EditorConfig, SnapTieBreak, TimeSpan, TimelineConfig};
use vibeclip_timeline::{
    DropPayload, EditOutcome, Timeline, TimelineCommand, Track, TrackKind,
};

// ── Helpers ────────────────────────────────────────────────────

fn drop_json(timeline: &mut Timeline, json: &str, at: f64) -> EditOutcome {
    let payload = DropPayload::from_json(json).unwrap();
    timeline
        .apply(TimelineCommand::Place {
            payload,
            raw_time: at,
        })
        .unwrap()
}

fn new_media(timeline: &mut Timeline, duration: f64, at: f64) -> (Uuid, Uuid) {
    let json = format!(r#"{{"type":"new-media","sourceId":"v","duration":{duration}}}"#);
    match drop_json(timeline, &json, at) {
        EditOutcome::Placed(p) => (p.track_id, p.clip_id),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

fn video_tracks(timeline: &Timeline) -> Vec<&Track> {
    timeline.tracks_of_kind(TrackKind::Video).collect()
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn first_drop_at_negative_time() {
    let mut timeline = Timeline::default();
    new_media(&mut timeline, 30.0, -5.0);

    let clip = timeline.clips().next().unwrap();
    assert_eq!(clip.span(), TimeSpan::new(0.0, 30.0));
    assert_eq!(timeline.duration(), 35.0);
    assert_eq!(format_duration(timeline.duration()), "00:35");
}

#[test]
fn snap_to_clip_end_at_max_zoom() {
    let mut timeline = Timeline::default();
    timeline.apply(TimelineCommand::SetZoom { factor: 5.0 }).unwrap();
    new_media(&mut timeline, 10.0, 0.0);
    let (_, second) = new_media(&mut timeline, 10.0, 9.95);

    let (_, clip) = timeline.find_clip(second).unwrap();
    assert_eq!(clip.start_time, 10.0);
    assert_eq!(clip.end_time, 20.0);
    assert_eq!(video_tracks(&timeline).len(), 1);
}

#[test]
fn overlapping_drops_spread_over_tracks() {
    let mut timeline = Timeline::with_tracks(
        TimelineConfig::default(),
        vec![Track::new_video("Video 1"), Track::new_audio("Music")],
    );
    new_media(&mut timeline, 10.0, 0.0);
    new_media(&mut timeline, 10.0, 5.0);

    let tracks = video_tracks(&timeline);
    assert_eq!(tracks.len(), 2);
    assert!(tracks.iter().all(|t| t.clip_count() == 1));
    // New video tracks stay grouped ahead of the audio track
    assert_eq!(timeline.tracks()[2].kind, TrackKind::Audio);
}

#[test]
fn cleanup_removes_only_secondary_tracks() {
    let mut timeline = Timeline::default();
    let (primary, a) = new_media(&mut timeline, 10.0, 0.0);
    let (secondary, b) = new_media(&mut timeline, 10.0, 5.0);
    assert_ne!(primary, secondary);

    timeline
        .apply(TimelineCommand::Delete {
            track_id: secondary,
            clip_id: b,
        })
        .unwrap();
    assert!(timeline.track(secondary).is_none());

    timeline
        .apply(TimelineCommand::Delete {
            track_id: primary,
            clip_id: a,
        })
        .unwrap();
    assert!(timeline.track(primary).is_some());
    assert_eq!(timeline.duration(), 0.0);
}

#[test]
fn shot_and_music_payloads() {
    let mut timeline = Timeline::default();
    drop_json(
        &mut timeline,
        r#"{"type":"existing-shot","sourceId":"v2","sourceStart":12.5,"sourceEnd":18,"duration":5.5}"#,
        3.0,
    );
    drop_json(
        &mut timeline,
        r#"{"type":"audio-asset","sourceId":"/music/upbeat.mp3","duration":"4:10"}"#,
        0.0,
    );

    let music = timeline.primary_track(TrackKind::Audio).unwrap();
    assert_eq!(music.clips[0].span(), TimeSpan::new(0.0, 250.0));
    assert_eq!(music.clips[0].source_id, "/music/upbeat.mp3");
    let video = timeline.primary_track(TrackKind::Video).unwrap();
    assert_eq!(video.clips[0].source_span(), TimeSpan::new(12.5, 18.0));
    assert_eq!(timeline.duration(), 255.0);
}

#[test]
fn move_between_tracks_keeps_identity() {
    let mut timeline = Timeline::default();
    new_media(&mut timeline, 10.0, 0.0);
    let (secondary, b) = new_media(&mut timeline, 4.0, 2.0);
    assert_eq!(video_tracks(&timeline).len(), 2);

    let json = format!(
        r#"{{"type":"move-clip","clipId":"{b}","trackId":"{secondary}","duration":4}}"#
    );
    match drop_json(&mut timeline, &json, 10.2) {
        EditOutcome::Placed(p) => {
            assert_eq!(p.clip_id, b);
            assert_eq!(p.span, TimeSpan::new(10.0, 14.0));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(video_tracks(&timeline).len(), 1);
    assert!(timeline.verify().is_ok());
}

#[test]
fn nearest_tie_break_from_config() {
    let config: EditorConfig =
        EditorConfig::from_json(br#"{"timeline":{"snapTieBreak":"nearest"}}"#).unwrap();
    assert_eq!(config.timeline.snap_tie_break, SnapTieBreak::Nearest);

    let mut timeline = Timeline::new(config.timeline);
    new_media(&mut timeline, 10.0, 0.0);
    new_media(&mut timeline, 2.0, 10.6);
    // Start 10.35 is within 0.5 of both 10.0 and 10.6; nearest wins
    let (_, c) = new_media(&mut timeline, 1.0, 10.35);
    assert_eq!(timeline.find_clip(c).unwrap().1.start_time, 10.6);
}

#[test]
fn snapshot_serializes_camel_case() {
    let mut timeline = Timeline::default();
    new_media(&mut timeline, 3.0, 1.0);
    let json = serde_json::to_value(timeline.snapshot()).unwrap();
    assert_eq!(json["displayDuration"], 30.0);
    assert_eq!(json["tracks"][0]["type"], "video");
    assert_eq!(json["tracks"][1]["isMuted"], false);
    assert_eq!(json["tracks"][0]["clips"][0]["startTime"], 1.0);
}

// ── Invariants under random edits ─────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Insert { video: bool, at: f64, duration: f64 },
    Move { index: usize, at: f64 },
    Delete { index: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<bool>(), -10.0f64..120.0, 0.1f64..30.0)
            .prop_map(|(video, at, duration)| Op::Insert { video, at, duration }),
        (0usize..64, -10.0f64..120.0).prop_map(|(index, at)| Op::Move { index, at }),
        (0usize..64).prop_map(|index| Op::Delete { index }),
    ]
}

fn pick_clip(timeline: &Timeline, index: usize) -> Option<(Uuid, Uuid)> {
    let all: Vec<(Uuid, Uuid)> = timeline
        .tracks()
        .iter()
        .flat_map(|t| t.clips.iter().map(move |c| (t.id, c.id)))
        .collect();
    (!all.is_empty()).then(|| all[index % all.len()])
}

fn command_for(timeline: &Timeline, op: &Op) -> Option<TimelineCommand> {
    match *op {
        Op::Insert { video, at, duration } => {
            let payload = if video {
                DropPayload::NewMedia {
                    source_id: "v".into(),
                    duration,
                }
            } else {
                DropPayload::AudioAsset {
                    source_id: "/music/a.mp3".into(),
                    duration: duration.into(),
                }
            };
            Some(TimelineCommand::Place {
                payload,
                raw_time: at,
            })
        }
        Op::Move { index, at } => pick_clip(timeline, index).map(|(_, clip_id)| {
            TimelineCommand::Move {
                clip_id,
                raw_time: at,
            }
        }),
        Op::Delete { index } => pick_clip(timeline, index)
            .map(|(track_id, clip_id)| TimelineCommand::Delete { track_id, clip_id }),
    }
}

proptest! {
    #[test]
    fn invariants_hold_under_random_edits(
        ops in prop::collection::vec(op_strategy(), 1..40),
        zoom in 0.1f64..5.0,
    ) {
        let mut timeline = Timeline::default();
        timeline.set_zoom(zoom);

        for op in &ops {
            let Some(command) = command_for(&timeline, op) else { continue };
            let moved = match &command {
                TimelineCommand::Move { clip_id, .. } => timeline
                    .find_clip(*clip_id)
                    .map(|(_, c)| (c.id, c.source_span())),
                _ => None,
            };
            prop_assert!(timeline.apply(command).is_ok());
            prop_assert!(timeline.verify().is_ok());

            // Moves never change what part of the source plays
            if let Some((id, source)) = moved {
                let (_, clip) = timeline.find_clip(id).unwrap();
                prop_assert_eq!(clip.source_span(), source);
            }

            for track in timeline.tracks() {
                for (i, a) in track.clips.iter().enumerate() {
                    prop_assert!(a.start_time >= 0.0);
                    prop_assert!(a.start_time < a.end_time);
                    prop_assert!((a.source_span().duration() - a.duration()).abs() < 1e-9);
                    for b in &track.clips[i + 1..] {
                        prop_assert!(!a.overlaps(b));
                    }
                }
            }

            prop_assert_eq!(timeline.duration(), timeline.derived_duration());
            prop_assert!(timeline.duration() >= timeline.content_end());

            // Only primary tracks may be empty
            for kind in [TrackKind::Video, TrackKind::Audio] {
                let primary = timeline.primary_track(kind).map(|t| t.id);
                prop_assert!(primary.is_some());
                for track in timeline.tracks_of_kind(kind) {
                    prop_assert!(!track.is_empty() || Some(track.id) == primary);
                }
            }
        }
    }
}
