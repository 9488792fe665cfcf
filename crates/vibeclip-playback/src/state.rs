//! Per-track synchronization state machine.
//!
//! `Seeking` and `Transitioning` bridge the gap between asking a handle to
//! change position or source and the handle actually getting there. While a
//! track is in either state its native progress is not fed back into master
//! time.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No clip attached.
    #[default]
    Idle,
    Playing,
    Paused,
    /// Repositioning after an explicit seek.
    Seeking,
    /// Switching to another clip at a boundary or after an edit.
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The track lost its clip (gap or no clips left).
    Detached,
    PlayRequested,
    PauseRequested,
    SeekStarted,
    /// A clip was attached or swapped in.
    HandOffStarted,
    /// The settle window elapsed and the handle is ready.
    Settled { attached: bool, playing: bool },
    /// Playback reached the end of the content.
    Ended,
    /// The handle failed or the source is missing.
    Failed,
}

impl SyncState {
    /// Transition table.
    pub fn on(self, event: SyncEvent) -> Self {
        use SyncEvent as E;
        use SyncState as S;

        match (self, event) {
            (_, E::SeekStarted) => S::Seeking,
            (_, E::Failed) => S::Idle,
            (S::Seeking, E::HandOffStarted) => S::Seeking,
            (_, E::HandOffStarted) => S::Transitioning,
            (S::Seeking | S::Transitioning, E::Settled { attached, playing }) => {
                match (attached, playing) {
                    (false, _) => S::Idle,
                    (true, true) => S::Playing,
                    (true, false) => S::Paused,
                }
            }
            // Everything else waits for the settle
            (S::Seeking | S::Transitioning, _) => self,
            (_, E::Detached) => S::Idle,
            (S::Paused, E::PlayRequested) => S::Playing,
            (S::Playing, E::PauseRequested | E::Ended) => S::Paused,
            (state, _) => state,
        }
    }

    /// Whether native progress must be ignored.
    pub fn suppresses_feedback(self) -> bool {
        matches!(self, Self::Seeking | Self::Transitioning)
    }
}

/// Synchronization bookkeeping for one handle.
#[derive(Debug, Clone)]
pub struct TrackSync {
    pub state: SyncState,
    /// Clip the handle is positioned on.
    pub clip_id: Option<Uuid>,
    /// Whether the handle reported ready since its last source change.
    pub ready: bool,
    /// Clip whose source failed; not re-attached until the cursor leaves it.
    pub failed_clip: Option<Uuid>,
    settle_at: Option<Instant>,
}

impl TrackSync {
    pub fn new() -> Self {
        Self {
            state: SyncState::Idle,
            clip_id: None,
            ready: true,
            failed_clip: None,
            settle_at: None,
        }
    }

    /// Earliest time the current suppression may be released.
    pub fn settle_at(&self) -> Option<Instant> {
        self.settle_at
    }

    /// Enter a suppressing state until at least `until`. A later deadline
    /// already in force is kept.
    pub fn suppress(&mut self, event: SyncEvent, until: Instant) {
        self.state = self.state.on(event);
        self.settle_at = Some(self.settle_at.map_or(until, |at| at.max(until)));
    }

    /// Release suppression if the settle window passed and the handle is ready.
    /// Returns true when the state changed.
    pub fn try_settle(&mut self, now: Instant, playing: bool) -> bool {
        if !self.state.suppresses_feedback() || !self.ready {
            return false;
        }
        if self.settle_at.is_some_and(|at| now < at) {
            return false;
        }
        self.state = self.state.on(SyncEvent::Settled {
            attached: self.clip_id.is_some(),
            playing,
        });
        self.settle_at = None;
        true
    }

    /// Record a failure on `clip_id` and go idle.
    pub fn fail(&mut self, clip_id: Uuid) {
        self.failed_clip = Some(clip_id);
        self.clip_id = None;
        self.ready = true;
        self.settle_at = None;
        self.state = self.state.on(SyncEvent::Failed);
    }
}

impl Default for TrackSync {
    fn default() -> Self {
        Self::new()
    }
}
