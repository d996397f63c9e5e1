//! Tag index (P6 Taxonomies): `tag -> sorted page paths`, persisted so an
//! incremental build can patch only the tags touched by changed pages
//! instead of rebuilding the whole index.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::atomic_io;
use crate::core::Page;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagIndex {
    tags: BTreeMap<String, BTreeSet<String>>,
}

impl TagIndex {
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(&self.tags)?;
        atomic_io::write_text(path, &json)
    }

    pub fn pages_for(&self, tag: &str) -> Vec<&String> {
        self.tags.get(tag).map(|s| s.iter().collect()).unwrap_or_default()
    }

    pub fn tags(&self) -> impl Iterator<Item = &String> {
        self.tags.keys()
    }

    /// Rebuild from scratch over every non-draft page (full-build path,
    /// or when the global R1-R4 decision forces a full rebuild).
    pub fn rebuild_full(pages: &[&Page]) -> Self {
        let mut tags: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for page in pages {
            if page.is_draft() {
                continue;
            }
            for tag in &page.meta.tags {
                tags.entry(tag.clone()).or_default().insert(page.source_path.clone());
            }
        }
        Self { tags }
    }

    /// Patch in place: drop each changed page from every tag bucket it
    /// currently sits in, then re-add it under its current tags. Safe to
    /// call with pages that gained, lost, or kept their tags.
    pub fn patch(&mut self, changed_pages: &[&Page]) {
        for page in changed_pages {
            for bucket in self.tags.values_mut() {
                bucket.remove(&page.source_path);
            }
            if !page.is_draft() {
                for tag in &page.meta.tags {
                    self.tags.entry(tag.clone()).or_default().insert(page.source_path.clone());
                }
            }
        }
        self.tags.retain(|_, bucket| !bucket.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PageMeta;
    use tempfile::TempDir;

    fn tagged_page(path: &str, tags: &[&str]) -> Page {
        let mut meta = PageMeta::default();
        meta.tags = tags.iter().map(|t| t.to_string()).collect();
        Page::new(path.to_string(), String::new(), meta)
    }

    #[test]
    fn test_rebuild_full_groups_by_tag() {
        let a = tagged_page("a.md", &["rust", "ssg"]);
        let b = tagged_page("b.md", &["rust"]);
        let index = TagIndex::rebuild_full(&[&a, &b]);
        assert_eq!(index.pages_for("rust").len(), 2);
        assert_eq!(index.pages_for("ssg"), vec![&"a.md".to_string()]);
    }

    #[test]
    fn test_draft_pages_excluded() {
        let mut meta = PageMeta::default();
        meta.tags = vec!["rust".into()];
        meta.draft = true;
        let draft = Page::new("draft.md".into(), String::new(), meta);
        let index = TagIndex::rebuild_full(&[&draft]);
        assert!(index.pages_for("rust").is_empty());
    }

    #[test]
    fn test_patch_moves_page_between_tags() {
        let a = tagged_page("a.md", &["rust"]);
        let mut index = TagIndex::rebuild_full(&[&a]);

        let moved = tagged_page("a.md", &["go"]);
        index.patch(&[&moved]);

        assert!(index.pages_for("rust").is_empty());
        assert_eq!(index.pages_for("go"), vec![&"a.md".to_string()]);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tags.json");
        let a = tagged_page("a.md", &["rust"]);
        let index = TagIndex::rebuild_full(&[&a]);
        index.save(&path).unwrap();

        let loaded = TagIndex::load(&path);
        assert_eq!(loaded.pages_for("rust"), vec![&"a.md".to_string()]);
    }
}
