//! Edit/playback scripts for the headless runner.
//!
//! A script lists media assets, optionally a media manifest to load them from,
//! and a sequence of steps. Steps address tracks
//! by index and clips by their index in start order within the track, since
//! ids are only known once clips exist.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use vibeclip_core::{EditorConfig, Seconds};
use vibeclip_playback::{
    EditorSession, InMemoryRegistry, MediaAsset, MediaKind, MemoryHandle, PlaybackHandle,
};
use vibeclip_timeline::{BeatMarker, DropPayload};

pub type Session = EditorSession<MemoryHandle, InMemoryRegistry>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Media manifest, relative to the script's directory.
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub assets: Vec<MediaAsset>,
    pub steps: Vec<Step>,
}

fn default_step_ms() -> u64 {
    40
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    Drop {
        payload: DropPayload,
        at: Seconds,
    },
    Move {
        track: usize,
        clip: usize,
        at: Seconds,
    },
    Delete {
        track: usize,
        clip: usize,
    },
    Play,
    Pause,
    Seek {
        to: Seconds,
    },
    /// Let playback run for `seconds`, in slices of `step_ms`.
    #[serde(rename_all = "camelCase")]
    Advance {
        seconds: Seconds,
        #[serde(default = "default_step_ms")]
        step_ms: u64,
    },
    Zoom {
        factor: f64,
    },
    Mute {
        track: usize,
    },
    Lock {
        track: usize,
    },
    Volume {
        value: u8,
    },
    Beats {
        timestamps: Vec<Seconds>,
    },
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse script {}", path.display()))
    }

    /// Build the media registry: the manifest's assets, if any, then the
    /// script's own assets on top.
    pub fn registry(&self, base_dir: &Path) -> Result<InMemoryRegistry> {
        let mut registry = match &self.manifest {
            Some(manifest) => {
                let path = base_dir.join(manifest);
                InMemoryRegistry::load(&path)
                    .with_context(|| format!("Failed to load manifest {}", path.display()))?
            }
            None => InMemoryRegistry::new(),
        };
        for asset in &self.assets {
            registry.insert(asset.clone());
        }
        Ok(registry)
    }
}

/// Runs a script against a session with in-memory handles and a synthetic clock.
pub struct Runner {
    session: Session,
    now: Instant,
}

impl Runner {
    pub fn new(config: EditorConfig, registry: InMemoryRegistry) -> Self {
        Self {
            session: EditorSession::new(
                config,
                MemoryHandle::new("video"),
                MemoryHandle::new("audio"),
                registry,
            ),
            now: Instant::now(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn run(&mut self, steps: Vec<Step>) {
        let count = steps.len();
        for step in steps {
            self.step(step);
            self.deliver_ready();
        }
        info!(steps = count, "Script finished");
    }

    fn step(&mut self, step: Step) {
        let now = self.now;
        match step {
            Step::Drop { payload, at } => {
                self.session.insert_clip(payload, at, now);
            }
            Step::Move { track, clip, at } => {
                if let Some((_, clip_id)) = self.clip_at(track, clip) {
                    self.session.move_clip(clip_id, at, now);
                }
            }
            Step::Delete { track, clip } => {
                if let Some((track_id, clip_id)) = self.clip_at(track, clip) {
                    self.session.delete_clip(track_id, clip_id, now);
                }
            }
            Step::Play => self.session.set_playing(true, now),
            Step::Pause => self.session.set_playing(false, now),
            Step::Seek { to } => self.session.seek(to, now),
            Step::Advance { seconds, step_ms } => self.advance(seconds, step_ms),
            Step::Zoom { factor } => {
                self.session.set_zoom(factor);
            }
            Step::Mute { track } => {
                if let Some(track_id) = self.track_at(track) {
                    self.session.toggle_track_mute(track_id, now);
                }
            }
            Step::Lock { track } => {
                if let Some(track_id) = self.track_at(track) {
                    self.session.toggle_track_lock(track_id, now);
                }
            }
            Step::Volume { value } => self.session.set_volume(value),
            Step::Beats { timestamps } => self
                .session
                .set_beat_markers(timestamps.into_iter().map(|t| BeatMarker::new(t, 1.0)).collect()),
        }
    }

    fn track_at(&self, index: usize) -> Option<Uuid> {
        let id = self.session.timeline().tracks().get(index).map(|t| t.id);
        if id.is_none() {
            warn!(index, "No track at index");
        }
        id
    }

    fn clip_at(&self, track: usize, clip: usize) -> Option<(Uuid, Uuid)> {
        let found = self
            .session
            .timeline()
            .tracks()
            .get(track)
            .and_then(|t| t.sorted_clips().get(clip).map(|c| (t.id, c.id)));
        if found.is_none() {
            warn!(track, clip, "No clip at index");
        }
        found
    }

    /// Hand pending ready signals from the handles to the session.
    fn deliver_ready(&mut self) {
        for kind in MediaKind::ALL {
            if let Some(source) = self.session.handle_mut(kind).take_ready() {
                self.session.on_ready(kind, &source, self.now);
            }
        }
    }

    fn advance(&mut self, seconds: Seconds, step_ms: u64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            warn!(seconds, "Ignoring advance with no positive duration");
            return;
        }
        let total = match Duration::try_from_secs_f64(seconds) {
            Ok(total) => total,
            Err(e) => {
                warn!(seconds, error = %e, "Ignoring advance that does not fit a duration");
                return;
            }
        };
        let slice = Duration::from_millis(step_ms.max(1));
        let mut elapsed = Duration::ZERO;

        while elapsed < total {
            let dt = slice.min(total - elapsed);
            elapsed += dt;
            self.now += dt;

            for kind in MediaKind::ALL {
                let handle = self.session.handle_mut(kind);
                if handle.is_paused() || handle.source().is_none() {
                    continue;
                }
                let native = handle.advance(dt.as_secs_f64());
                self.session.on_progress(kind, native, self.now);
            }
            self.deliver_ready();
            self.session.tick(self.now);
        }
    }
}
