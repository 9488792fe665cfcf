//! Clip lookup by timeline time.
//!
//! Both functions expect clips sorted by start time, as returned by
//! `Track::sorted_clips`.

use vibeclip_core::Seconds;
use vibeclip_timeline::Clip;

/// Clip covering `time`, or the last clip when `time` sits within
/// `end_epsilon` of its end.
pub fn find_clip_at_time<'a>(
    time: Seconds,
    clips: &[&'a Clip],
    end_epsilon: Seconds,
) -> Option<&'a Clip> {
    if let Some(clip) = clips.iter().find(|c| c.span().contains(time)) {
        return Some(*clip);
    }
    clips
        .last()
        .filter(|last| (time - last.end_time).abs() < end_epsilon)
        .copied()
}

/// First clip starting at or after `after`.
pub fn find_next_clip<'a>(after: Seconds, clips: &[&'a Clip]) -> Option<&'a Clip> {
    clips.iter().find(|c| c.start_time >= after).copied()
}
