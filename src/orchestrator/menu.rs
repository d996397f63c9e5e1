//! Navigation menu (P7 Menus): a tree mirroring the section arena, for
//! templates to render top-level and nested navigation without walking
//! `BuildContext` themselves.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::{apply_baseurl, Section, UrlPath};

#[derive(Debug, Clone, Serialize)]
pub struct MenuItem {
    pub title: String,
    pub url: String,
    pub children: Vec<MenuItem>,
}

/// Build the menu tree from the root section down. Synthesized sections
/// (no `_index.md` of their own, only a generated archive) still appear —
/// only `Section::is_virtual` sections are skipped, since those exist
/// purely as taxonomy/pagination scaffolding, not navigation.
pub fn build(sections: &HashMap<String, Section>, baseurl: &str) -> Vec<MenuItem> {
    build_children(sections, "", baseurl)
}

fn build_children(sections: &HashMap<String, Section>, parent_path: &str, baseurl: &str) -> Vec<MenuItem> {
    let Some(parent) = sections.get(parent_path) else {
        return Vec::new();
    };
    parent
        .subsection_paths
        .iter()
        .filter_map(|path| sections.get(path))
        .filter(|s| !s.is_virtual)
        .map(|s| MenuItem {
            title: display_title(&s.name),
            url: apply_baseurl(baseurl, UrlPath::from_page(&s.path).as_str()),
            children: build_children(sections, &s.path, baseurl),
        })
        .collect()
}

fn display_title(name: &str) -> String {
    let mut chars = name.replace(['-', '_'], " ").chars().collect::<Vec<_>>();
    if let Some(first) = chars.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Section, SectionKind};

    fn section(path: &str, parent: &str, subsections: &[&str]) -> Section {
        Section {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            parent_path: Some(parent.to_string()),
            subsection_paths: subsections.iter().map(|s| s.to_string()).collect(),
            page_paths: Vec::new(),
            index_page: None,
            metadata: crate::core::Value::Null,
            is_virtual: false,
            kind: SectionKind::List,
        }
    }

    #[test]
    fn test_builds_top_level_entries() {
        let mut sections = HashMap::new();
        sections.insert(String::new(), section("", "", &["blog"]));
        sections.insert("blog".to_string(), section("blog", "", &[]));

        let menu = build(&sections, "");
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].title, "Blog");
        assert_eq!(menu[0].url, "/blog/");
    }

    #[test]
    fn test_nested_sections_become_children() {
        let mut sections = HashMap::new();
        sections.insert(String::new(), section("", "", &["docs"]));
        sections.insert("docs".to_string(), section("docs", "", &["docs/guides"]));
        sections.insert("docs/guides".to_string(), section("docs/guides", "docs", &[]));

        let menu = build(&sections, "");
        assert_eq!(menu[0].children.len(), 1);
        assert_eq!(menu[0].children[0].title, "Guides");
    }

    #[test]
    fn test_virtual_sections_excluded() {
        let mut sections = HashMap::new();
        sections.insert(String::new(), section("", "", &["tags"]));
        let mut tags = section("tags", "", &[]);
        tags.is_virtual = true;
        sections.insert("tags".to_string(), tags);

        assert!(build(&sections, "").is_empty());
    }

    #[test]
    fn test_display_title_replaces_separators() {
        assert_eq!(display_title("api-reference"), "Api reference");
    }
}
