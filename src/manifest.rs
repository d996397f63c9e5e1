//! Logical-path -> fingerprinted-output-path map, persisted as JSON
//! on disk. Schema: version 1, assets sorted
//! alphabetically by logical path, pretty-printed with a trailing
//! newline.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::atomic_io;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifestEntry {
    pub output_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    version: u32,
    generated_at: String,
    assets: BTreeMap<String, AssetManifestEntry>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self {
            version: 1,
            generated_at: crate::utils::date::DateTimeUtc::now_utc().to_rfc3339(),
            assets: BTreeMap::new(),
        }
    }

    pub fn set_entry(
        &mut self,
        logical_path: impl Into<String>,
        output_path: impl Into<String>,
        fingerprint: Option<String>,
        size_bytes: Option<u64>,
        updated_at: Option<String>,
    ) {
        self.assets.insert(
            logical_path.into(),
            AssetManifestEntry {
                output_path: output_path.into(),
                fingerprint,
                size_bytes,
                updated_at,
            },
        );
    }

    pub fn get(&self, logical_path: &str) -> Option<&AssetManifestEntry> {
        self.assets.get(logical_path)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &AssetManifestEntry)> {
        self.assets.iter()
    }

    /// Write the manifest atomically. `assets` is already a `BTreeMap`, so
    /// serialization order is deterministic by construction.
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        atomic_io::write_text(path, &json)
    }

    /// Tolerate a missing or corrupt manifest by returning `None` rather
    /// than failing the build.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self::new()
    }
}
