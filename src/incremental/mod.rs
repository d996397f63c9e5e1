//! `IncrementalFilterEngine`: the R1-R7 page-rebuild decision table
//! plus the reduced asset rule set and the subvenance fan-out rule.

use std::collections::HashSet;
use std::path::Path;

use crate::core::Page;
use crate::hash::ContentHash;
use crate::provenance::{Provenance, ProvenanceStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    FullRebuild,
    CacheHit,
    CacheMiss,
}

pub struct IncrementalContext<'a> {
    pub incremental_enabled: bool,
    pub config_hash_changed: bool,
    pub output_dir: &'a Path,
    pub manifest_path: &'a Path,
    pub autodoc_missing: bool,
}

/// R1-R4: whole-build decisions that short-circuit per-page evaluation.
pub fn global_decision(ctx: &IncrementalContext) -> Option<Decision> {
    if !ctx.incremental_enabled {
        return Some(Decision::FullRebuild); // R1
    }
    if ctx.config_hash_changed {
        return Some(Decision::FullRebuild); // R2
    }
    let output_missing_or_empty = !ctx.output_dir.exists()
        || std::fs::read_dir(ctx.output_dir).map(|mut d| d.next().is_none()).unwrap_or(true);
    if output_missing_or_empty || !ctx.manifest_path.exists() {
        return Some(Decision::FullRebuild); // R3
    }
    if ctx.autodoc_missing {
        return Some(Decision::FullRebuild); // R4
    }
    None
}

/// R5-R7: per-page decision, given the page's freshly-probed provenance
/// and the set of pages that `fan_out_affected` has already determined
/// depend on a template/partial/data input that changed since the last
/// render (the probe itself can only see a page's directly addressable
/// inputs, never its transitively-included partials or `data()` reads, so
/// that detection has to happen ahead of this call rather than here).
pub fn page_decision(
    page_id: &str,
    current_provenance: &Provenance,
    store: &ProvenanceStore,
    forced_rebuild: &HashSet<String>,
) -> Decision {
    if forced_rebuild.contains(page_id) {
        return Decision::CacheMiss; // R5
    }
    if store.is_fresh(page_id, current_provenance) {
        Decision::CacheHit // R6
    } else {
        Decision::CacheMiss // R7
    }
}

/// Subvenance fan-out: for every input whose content hash changed between
/// builds, union in every page whose last-recorded provenance referenced
/// the old hash. This is what lets a changed partial or `data()` source
/// invalidate its dependents even though no per-page probe ever named it.
pub fn fan_out_affected(store: &ProvenanceStore, changed_old_hashes: &[ContentHash]) -> HashSet<String> {
    let mut affected = HashSet::new();
    for hash in changed_old_hashes {
        affected.extend(store.get_affected_by(&hash.to_hex()));
    }
    affected
}

/// Asset reprocessing rule: R1-R3 force reprocessing everything; otherwise
/// only assets whose source hash changed since the last recorded hash.
pub fn assets_to_reprocess<'a>(
    assets: &'a [(String, ContentHash)],
    previous_hashes: &std::collections::HashMap<String, ContentHash>,
    force_all: bool,
) -> Vec<&'a str> {
    if force_all {
        return assets.iter().map(|(path, _)| path.as_str()).collect();
    }
    assets
        .iter()
        .filter(|(path, hash)| previous_hashes.get(path) != Some(hash))
        .map(|(path, _)| path.as_str())
        .collect()
}

/// Union of tags on the given pages, for taxonomy rebuild scoping.
pub fn affected_tags(pages: &[&Page]) -> HashSet<String> {
    pages.iter().flat_map(|p| p.meta.tags.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::{InputRecord, InputType};
    use tempfile::TempDir;

    #[test]
    fn test_r1_incremental_disabled_forces_full_rebuild() {
        let dir = TempDir::new().unwrap();
        let ctx = IncrementalContext {
            incremental_enabled: false,
            config_hash_changed: false,
            output_dir: dir.path(),
            manifest_path: &dir.path().join("asset-manifest.json"),
            autodoc_missing: false,
        };
        assert_eq!(global_decision(&ctx), Some(Decision::FullRebuild));
    }

    #[test]
    fn test_r3_missing_manifest_forces_full_rebuild() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("out/index.html"), "x").unwrap();
        let ctx = IncrementalContext {
            incremental_enabled: true,
            config_hash_changed: false,
            output_dir: &dir.path().join("out"),
            manifest_path: &dir.path().join("asset-manifest.json"),
            autodoc_missing: false,
        };
        assert_eq!(global_decision(&ctx), Some(Decision::FullRebuild));
    }

    #[test]
    fn test_no_global_rule_matches_returns_none() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(dir.path().join("out/index.html"), "x").unwrap();
        std::fs::write(dir.path().join("asset-manifest.json"), "{}").unwrap();
        let ctx = IncrementalContext {
            incremental_enabled: true,
            config_hash_changed: false,
            output_dir: &dir.path().join("out"),
            manifest_path: &dir.path().join("asset-manifest.json"),
            autodoc_missing: false,
        };
        assert_eq!(global_decision(&ctx), None);
    }

    #[test]
    fn test_r5_forced_rebuild_overrides_fresh_provenance() {
        let dir = TempDir::new().unwrap();
        let store = ProvenanceStore::load(dir.path());
        let provenance = Provenance::from_inputs(vec![InputRecord::new(
            InputType::Content,
            "a.md",
            crate::hash::hash_str("a"),
        )]);
        store.store(crate::provenance::ProvenanceRecord {
            page_id: "a.md".into(),
            provenance: provenance.clone(),
            output_hash: crate::hash::hash_str("out"),
            created_at: String::new(),
            build_id: None,
        });

        let mut forced = HashSet::new();
        forced.insert("a.md".to_string());
        assert_eq!(page_decision("a.md", &provenance, &store, &forced), Decision::CacheMiss);
    }

    #[test]
    fn test_r6_fresh_page_is_cache_hit() {
        let dir = TempDir::new().unwrap();
        let store = ProvenanceStore::load(dir.path());
        let provenance = Provenance::from_inputs(vec![InputRecord::new(
            InputType::Content,
            "a.md",
            crate::hash::hash_str("a"),
        )]);
        store.store(crate::provenance::ProvenanceRecord {
            page_id: "a.md".into(),
            provenance: provenance.clone(),
            output_hash: crate::hash::hash_str("out"),
            created_at: String::new(),
            build_id: None,
        });
        assert_eq!(page_decision("a.md", &provenance, &store, &HashSet::new()), Decision::CacheHit);
    }

    #[test]
    fn test_fan_out_affected_unions_pages_across_changed_hashes() {
        let dir = TempDir::new().unwrap();
        let store = ProvenanceStore::load(dir.path());
        let nav_hash = crate::hash::hash_str("nav-v1");
        let footer_hash = crate::hash::hash_str("footer-v1");
        store.store(crate::provenance::ProvenanceRecord {
            page_id: "a.md".into(),
            provenance: Provenance::from_inputs(vec![InputRecord::new(InputType::Partial, "nav.html", nav_hash)]),
            output_hash: crate::hash::hash_str("out-a"),
            created_at: String::new(),
            build_id: None,
        });
        store.store(crate::provenance::ProvenanceRecord {
            page_id: "b.md".into(),
            provenance: Provenance::from_inputs(vec![InputRecord::new(InputType::Partial, "footer.html", footer_hash)]),
            output_hash: crate::hash::hash_str("out-b"),
            created_at: String::new(),
            build_id: None,
        });

        let affected = fan_out_affected(&store, &[nav_hash]);
        assert_eq!(affected, HashSet::from(["a.md".to_string()]));

        let affected_both = fan_out_affected(&store, &[nav_hash, footer_hash]);
        assert_eq!(affected_both, HashSet::from(["a.md".to_string(), "b.md".to_string()]));
    }

    #[test]
    fn test_assets_to_reprocess_only_changed() {
        let assets = vec![
            ("a.css".to_string(), crate::hash::hash_str("a")),
            ("b.css".to_string(), crate::hash::hash_str("b")),
        ];
        let mut previous = std::collections::HashMap::new();
        previous.insert("a.css".to_string(), crate::hash::hash_str("a"));
        previous.insert("b.css".to_string(), crate::hash::hash_str("old-b"));

        let result = assets_to_reprocess(&assets, &previous, false);
        assert_eq!(result, vec!["b.css"]);
    }
}
