//! `ProvenanceStore`: the persistent map `page_id -> ProvenanceRecord`
//! plus its inverse (subvenance) index.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::record::{InputType, Provenance, ProvenanceRecord};
use crate::atomic_io;
use crate::hash::ContentHash;
use crate::utils::path::route::url_to_safe_filename;

pub struct ProvenanceStore {
    records_dir: PathBuf,
    subvenance_path: PathBuf,
    records: Mutex<FxHashMap<String, ProvenanceRecord>>,
    subvenance: Mutex<HashMap<String, HashSet<String>>>,
}

#[derive(Debug, Default)]
pub struct ProvenanceStats {
    pub pages_tracked: usize,
    pub subvenance_entries: usize,
    pub total_input_references: usize,
}

impl ProvenanceStore {
    /// Load an existing store from `cache_dir/provenance/`, or start an
    /// empty one if it doesn't exist yet. Corrupt record files are
    /// skipped (treated as absent) rather than
    /// failing the whole load.
    pub fn load(cache_dir: &Path) -> Self {
        let base = cache_dir.join("provenance");
        let records_dir = base.join("records");
        let subvenance_path = base.join("subvenance.json");

        let mut records = FxHashMap::default();
        if let Ok(entries) = std::fs::read_dir(&records_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Ok(contents) = std::fs::read_to_string(&path) {
                    if let Ok(record) = serde_json::from_str::<ProvenanceRecord>(&contents) {
                        records.insert(record.page_id.clone(), record);
                    }
                }
            }
        }

        let subvenance = std::fs::read_to_string(&subvenance_path)
            .ok()
            .and_then(|s| serde_json::from_str::<HashMap<String, Vec<String>>>(&s).ok())
            .map(|m| m.into_iter().map(|(k, v)| (k, v.into_iter().collect())).collect())
            .unwrap_or_default();

        Self {
            records_dir,
            subvenance_path,
            records: Mutex::new(records),
            subvenance: Mutex::new(subvenance),
        }
    }

    pub fn get(&self, page_id: &str) -> Option<ProvenanceRecord> {
        self.records.lock().get(page_id).cloned()
    }

    /// `true` iff a stored record exists for `page_id` and every input in
    /// `current` (the pre-render probe) matches a same-typed,
    /// same-path entry in the stored record with an identical hash.
    ///
    /// This is a subset check rather than `combined_hash` equality: the
    /// probe only knows about a page's directly-addressable inputs
    /// (content, frontmatter, config, section, top-level template), while
    /// the stored record also carries whatever partials and `data()` reads
    /// the last real render happened to touch. Requiring the probe's
    /// known inputs to still match is sufficient to rule out a change in
    /// anything the probe can see; changes to the untracked partial/data
    /// inputs are instead caught by subvenance fan-out ahead of this call.
    pub fn is_fresh(&self, page_id: &str, current: &Provenance) -> bool {
        self.records.lock().get(page_id).is_some_and(|r| {
            current.inputs.iter().all(|probe| {
                r.provenance
                    .inputs
                    .iter()
                    .any(|stored| stored.input_type == probe.input_type && stored.logical_path == probe.logical_path && stored.hash == probe.hash)
            })
        })
    }

    /// The most recently recorded hash for every distinct `(input_type,
    /// logical_path)` pair of the given types, across all tracked pages.
    /// Used ahead of a build to find templates/partials/data files whose
    /// on-disk content no longer matches what was last rendered, so those
    /// changes can be fanned out to their dependent pages even though the
    /// pre-render probe never sees them directly.
    pub fn tracked_inputs(&self, types: &[InputType]) -> HashMap<(InputType, String), ContentHash> {
        let mut seen = HashMap::new();
        for record in self.records.lock().values() {
            for input in &record.provenance.inputs {
                if types.contains(&input.input_type) {
                    seen.insert((input.input_type, input.logical_path.clone()), input.hash);
                }
            }
        }
        seen
    }

    /// Store a new record, updating the subvenance index incrementally:
    /// stale mappings for the previous record (if any) are removed first,
    /// then new ones are added for the new record's inputs.
    pub fn store(&self, record: ProvenanceRecord) {
        let mut records = self.records.lock();
        let mut subvenance = self.subvenance.lock();

        if let Some(old) = records.get(&record.page_id) {
            for input in &old.provenance.inputs {
                let key = input.hash.to_hex();
                if let Some(set) = subvenance.get_mut(&key) {
                    set.remove(&record.page_id);
                    if set.is_empty() {
                        subvenance.remove(&key);
                    }
                }
            }
        }

        for input in &record.provenance.inputs {
            subvenance
                .entry(input.hash.to_hex())
                .or_default()
                .insert(record.page_id.clone());
        }

        records.insert(record.page_id.clone(), record);
    }

    pub fn get_affected_by(&self, input_hash_hex: &str) -> HashSet<String> {
        self.subvenance
            .lock()
            .get(input_hash_hex)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stats(&self) -> ProvenanceStats {
        let records = self.records.lock();
        let subvenance = self.subvenance.lock();
        ProvenanceStats {
            pages_tracked: records.len(),
            subvenance_entries: subvenance.len(),
            total_input_references: records.values().map(|r| r.provenance.inputs.len()).sum(),
        }
    }

    /// Flush in-memory state to disk: one JSON file per record plus the
    /// combined subvenance index, both via [`atomic_io`].
    pub fn save(&self) -> std::io::Result<()> {
        let records = self.records.lock();
        for (page_id, record) in records.iter() {
            let path = self.record_path(page_id);
            let json = serde_json::to_string_pretty(record)?;
            atomic_io::write_text(&path, &json)?;
        }

        let subvenance = self.subvenance.lock();
        let sorted: std::collections::BTreeMap<&String, Vec<&String>> = subvenance
            .iter()
            .map(|(k, v)| {
                let mut ids: Vec<&String> = v.iter().collect();
                ids.sort();
                (k, ids)
            })
            .collect();
        let json = serde_json::to_string_pretty(&sorted)?;
        atomic_io::write_text(&self.subvenance_path, &json)
    }

    fn record_path(&self, page_id: &str) -> PathBuf {
        self.records_dir.join(format!("{}.json", url_to_safe_filename(page_id)))
    }
}
