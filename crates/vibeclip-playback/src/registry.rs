//! Media asset registry: resolves clip source ids to playable sources.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;
use vibeclip_core::{Result, Seconds, VibeClipError};

use crate::engine::MediaKind;

/// Metadata for a video asset in the media library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: String,
    /// Playable location handed to the video handle
    pub path: String,
    pub duration: Seconds,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Lookup of playable sources.
pub trait MediaRegistry {
    /// Video asset for a clip's source id.
    fn video(&self, source_id: &str) -> Option<&MediaAsset>;

    /// Playable path for an audio clip's source id. Audio source ids are
    /// already paths, so by default the id is returned as is.
    fn audio_path(&self, source_id: &str) -> Option<String> {
        (!source_id.is_empty()).then(|| source_id.to_string())
    }

    /// Source a handle of `kind` should load for a clip's source id.
    fn playable_source(&self, kind: MediaKind, source_id: &str) -> Result<String> {
        let source = match kind {
            MediaKind::Video => self.video(source_id).map(|asset| asset.path.clone()),
            MediaKind::Audio => self.audio_path(source_id),
        };
        source.ok_or_else(|| VibeClipError::SourceNotFound(source_id.to_string()))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    #[serde(default)]
    assets: Vec<MediaAsset>,
}

/// Registry held in memory, optionally loaded from a JSON manifest of the
/// form `{"assets": [{"id", "path", "duration", "width", "height"}]}`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    assets: HashMap<String, MediaAsset>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset.
    pub fn insert(&mut self, asset: MediaAsset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn from_assets(assets: impl IntoIterator<Item = MediaAsset>) -> Self {
        let mut registry = Self::new();
        for asset in assets {
            registry.insert(asset);
        }
        registry
    }

    /// Parse a JSON manifest.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(data).map_err(|e| {
            VibeClipError::Serialization(format!("Failed to parse media manifest: {}", e))
        })?;
        Ok(Self::from_assets(manifest.assets))
    }

    /// Load a JSON manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let registry = Self::from_json(&data)?;
        info!(path = %path.display(), assets = registry.len(), "Loaded media manifest");
        Ok(registry)
    }
}

impl MediaRegistry for InMemoryRegistry {
    fn video(&self, source_id: &str) -> Option<&MediaAsset> {
        self.assets.get(source_id)
    }
}
