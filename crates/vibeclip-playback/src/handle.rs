//! Playback handles: the opaque media elements the engine drives.

use tracing::debug;
use vibeclip_core::{Result, Seconds, VibeClipError};

/// A single media element (one `<video>` or `<audio>` in a browser).
///
/// Loading a source is asynchronous on real handles. The engine does not wait
/// for it; readiness is reported back through the engine's `on_ready`, naming
/// the source that became ready.
pub trait PlaybackHandle {
    /// Start loading a new source. The handle is paused at time zero afterwards.
    fn load(&mut self, source: &str);
    /// Drop the current source.
    fn unload(&mut self);
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    /// Position within the current source, in source seconds.
    fn seek(&mut self, seconds: Seconds);
    fn current_time(&self) -> Seconds;
    fn is_paused(&self) -> bool;
    /// Source currently loaded, if any.
    fn source(&self) -> Option<&str>;
    /// Output volume in 0.0..=1.0.
    fn set_volume(&mut self, volume: f32);
}

/// Headless handle that keeps time in memory.
///
/// Time only moves when [`MemoryHandle::advance`] is called, which makes the
/// engine fully deterministic under test.
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    name: &'static str,
    source: Option<String>,
    time: Seconds,
    paused: bool,
    volume: f32,
    loads: Vec<String>,
    ready_pending: bool,
    fail_play: bool,
}

impl MemoryHandle {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            source: None,
            time: 0.0,
            paused: true,
            volume: 1.0,
            loads: Vec::new(),
            ready_pending: false,
            fail_play: false,
        }
    }

    /// Advance playback by `dt` seconds if playing. Returns the new time.
    pub fn advance(&mut self, dt: Seconds) -> Seconds {
        if !self.paused && self.source.is_some() && dt > 0.0 {
            self.time += dt;
        }
        self.time
    }

    /// Every source ever loaded, in order.
    pub fn loads(&self) -> &[String] {
        &self.loads
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// The loaded source, once after each load, when it would have become
    /// ready on a real element.
    pub fn take_ready(&mut self) -> Option<String> {
        if std::mem::take(&mut self.ready_pending) {
            self.source.clone()
        } else {
            None
        }
    }

    /// Make subsequent `play` calls fail, as a browser rejecting playback would.
    pub fn set_fail_play(&mut self, fail: bool) {
        self.fail_play = fail;
    }
}

impl PlaybackHandle for MemoryHandle {
    fn load(&mut self, source: &str) {
        debug!(handle = self.name, source, "Loading source");
        self.source = Some(source.to_string());
        self.loads.push(source.to_string());
        self.time = 0.0;
        self.paused = true;
        self.ready_pending = true;
    }

    fn unload(&mut self) {
        self.source = None;
        self.time = 0.0;
        self.paused = true;
        self.ready_pending = false;
    }

    fn play(&mut self) -> Result<()> {
        if self.fail_play {
            return Err(VibeClipError::Handle(format!(
                "{} handle refused to play",
                self.name
            )));
        }
        if self.source.is_none() {
            return Err(VibeClipError::Handle(format!(
                "{} handle has no source loaded",
                self.name
            )));
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn seek(&mut self, seconds: Seconds) {
        if seconds.is_finite() {
            self.time = seconds.max(0.0);
        }
    }

    fn current_time(&self) -> Seconds {
        self.time
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }
}
