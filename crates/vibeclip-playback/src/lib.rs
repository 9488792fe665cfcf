//! VibeClip Playback - playback synchronization engine
//!
//! This crate handles:
//! - Driving one playback handle per media kind from the timeline
//! - Seamless hand-off between clips from different sources
//! - Drift correction and seek/transition settling
//! - The editor session that ties edits and playback together

pub mod engine;
pub mod handle;
pub mod lookup;
pub mod registry;
pub mod session;
pub mod state;

pub use engine::{MediaKind, PlaybackCursor, PlaybackEngine, SyncMode};
pub use handle::{MemoryHandle, PlaybackHandle};
pub use lookup::{find_clip_at_time, find_next_clip};
pub use registry::{InMemoryRegistry, MediaAsset, MediaRegistry};
pub use session::{EditorSession, SessionSnapshot};
pub use state::{SyncEvent, SyncState, TrackSync};
