//! Integration test crate for VibeClip.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the timeline and playback crates to verify they work together.

#[cfg(test)]
mod timeline;

#[cfg(test)]
mod playback;
