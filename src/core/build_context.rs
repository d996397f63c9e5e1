//! `BuildContext`: the mutable, build-scoped half of a build.
//!
//! Created at the start of a build, mutated through every phase, released
//! at the end. The maps below are the "shared mutable state" enumerated
//! the build: each is either a `dashmap` (thread-safe read/write, used by
//! parallel phases P9/P10) or wrapped in `parking_lot::Mutex` where the
//! access pattern is append-only under contention.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;

use crate::core::{Asset, Page, Section};
use crate::provenance::ProvenanceStore;

#[derive(Debug, Default)]
pub struct BuildStats {
    pub pages_rendered: usize,
    pub pages_cache_hit: usize,
    pub pages_failed: usize,
    pub assets_processed: usize,
    pub assets_cache_hit: usize,
}

pub struct BuildContext {
    pub pages: DashMap<String, Page>,
    pub sections: DashMap<String, Section>,
    pub pages_to_build: Mutex<Vec<String>>,
    /// Pages `phase_incremental_filter` determined are stale only because
    /// a dependency outside the per-page probe (a partial or `data()`
    /// source) changed, via subvenance fan-out. Render must not let its own
    /// narrower freshness check override this and skip the re-render.
    pub forced_rebuild: DashSet<String>,
    pub assets: DashMap<String, Asset>,
    pub assets_to_process: DashSet<String>,
    pub provenance: Arc<ProvenanceStore>,
    pub stats: Mutex<BuildStats>,
    pub affected_tags: DashSet<String>,
    pub affected_sections: DashSet<String>,
    pub changed_page_paths: DashSet<String>,
    pub config_changed: AtomicBool,
    /// `page source_path -> asset URLs referenced in its rendered HTML`,
    /// accumulated during P10 and flushed to disk during P12.
    pub accumulated_page_assets: DashMap<String, Vec<String>>,
    pub cached_page_contents: DashMap<String, String>,
    pub incremental_mode: bool,
}

impl BuildContext {
    pub fn new(provenance: Arc<ProvenanceStore>, incremental_mode: bool) -> Self {
        Self {
            pages: DashMap::new(),
            sections: DashMap::new(),
            pages_to_build: Mutex::new(Vec::new()),
            forced_rebuild: DashSet::new(),
            assets: DashMap::new(),
            assets_to_process: DashSet::new(),
            provenance,
            stats: Mutex::new(BuildStats::default()),
            affected_tags: DashSet::new(),
            affected_sections: DashSet::new(),
            changed_page_paths: DashSet::new(),
            config_changed: AtomicBool::new(false),
            accumulated_page_assets: DashMap::new(),
            cached_page_contents: DashMap::new(),
            incremental_mode,
        }
    }

    pub fn mark_config_changed(&self) {
        self.config_changed.store(true, Ordering::Relaxed);
    }

    pub fn is_config_changed(&self) -> bool {
        self.config_changed.load(Ordering::Relaxed)
    }
}
