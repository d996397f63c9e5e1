//! Content-tree walk (P3 Discovery): turns a `content/` directory into a
//! flat set of `Page`s and a `Section` arena.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::core::{Page, PageMeta, Section, SectionKind, Value};
use crate::error::DiscoveryError;

use super::frontmatter;
use super::markdown;

pub struct DiscoveryResult {
    pub pages: Vec<Page>,
    pub sections: Vec<Section>,
    pub errors: Vec<DiscoveryError>,
}

/// Walk `content_dir`, parse every `.md`/`.markdown` file's frontmatter and
/// body, and build the section tree implied by directory structure. A
/// directory's `_index.md` (if present) becomes that section's index page
/// and supplies section-level metadata; its absence leaves `index_page`
/// unset for P5 to synthesize later.
pub fn discover(content_dir: &Path, strict: bool) -> Result<DiscoveryResult, DiscoveryError> {
    let mut pages = Vec::new();
    let mut errors = Vec::new();
    let mut sections: std::collections::BTreeMap<String, Section> = std::collections::BTreeMap::new();
    sections.insert(String::new(), Section::new_root());

    if !content_dir.exists() {
        return Ok(DiscoveryResult {
            pages,
            sections: sections.into_values().collect(),
            errors,
        });
    }

    for entry in WalkDir::new(content_dir).sort(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let err = DiscoveryError::Unreadable(content_dir.to_path_buf(), std::io::Error::other(e));
                if strict {
                    return Err(err);
                }
                errors.push(err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != "md" && ext != "markdown" {
            continue;
        }

        let relative = path
            .strip_prefix(content_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                let err = DiscoveryError::Unreadable(path.clone(), e);
                if strict {
                    return Err(err);
                }
                errors.push(err);
                continue;
            }
        };

        let parsed = frontmatter::parse(&raw);
        let meta = PageMeta::from_value(&parsed.frontmatter);
        let rendered = markdown::render_to_html(&parsed.body);

        let file_stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let parent_rel = path
            .parent()
            .and_then(|p| p.strip_prefix(content_dir).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        ensure_section_chain(&mut sections, &parent_rel);

        if file_stem == "_index" {
            let section = sections.entry(parent_rel.clone()).or_insert_with(|| {
                new_named_section(&parent_rel)
            });
            section.index_page = Some(relative.clone());
            section.metadata = parsed.frontmatter.clone();
            if let Some(kind_str) = meta.extra.get("kind").and_then(|v| v.as_str()) {
                section.kind = SectionKind::detect(Some(kind_str), &section.name, 0.0);
            }

            let mut page = Page::new(relative, parsed.body.clone(), meta);
            page.rendered_html = Some(rendered);
            page.section_path = Some(parent_rel);
            pages.push(page);
            continue;
        }

        let mut page = Page::new(relative.clone(), parsed.body, meta);
        page.rendered_html = Some(rendered);
        page.section_path = Some(parent_rel.clone());
        pages.push(page);

        if let Some(section) = sections.get_mut(&parent_rel) {
            section.page_paths.push(relative);
        }
    }

    finalize_dated_fraction(&mut sections, &pages);

    Ok(DiscoveryResult {
        pages,
        sections: sections.into_values().collect(),
        errors,
    })
}

fn new_named_section(path: &str) -> Section {
    let name = path.rsplit('/').next().unwrap_or(path).to_string();
    Section {
        name,
        path: path.to_string(),
        parent_path: parent_of(path),
        subsection_paths: Vec::new(),
        page_paths: Vec::new(),
        index_page: None,
        metadata: Value::Null,
        is_virtual: false,
        kind: SectionKind::List,
    }
}

fn parent_of(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(idx) => Some(path[..idx].to_string()),
        None => Some(String::new()),
    }
}

/// Make sure every ancestor of `path` exists as a `Section` and is linked
/// to its parent via `subsection_paths`, so the tree is navigable root-down
/// even if an intermediate directory has no `_index.md`.
fn ensure_section_chain(sections: &mut std::collections::BTreeMap<String, Section>, path: &str) {
    if path.is_empty() || sections.contains_key(path) {
        return;
    }
    let parent = parent_of(path).unwrap_or_default();
    ensure_section_chain(sections, &parent);

    sections.insert(path.to_string(), new_named_section(path));
    if let Some(parent_section) = sections.get_mut(&parent) {
        if !parent_section.subsection_paths.iter().any(|p| p == path) {
            parent_section.subsection_paths.push(path.to_string());
        }
    }
}

/// Re-derive each section's `kind` from the fraction of its direct pages
/// that carry a `date`, for sections with no explicit override.
fn finalize_dated_fraction(sections: &mut std::collections::BTreeMap<String, Section>, pages: &[Page]) {
    let page_dates: std::collections::HashMap<&str, bool> =
        pages.iter().map(|p| (p.source_path.as_str(), p.meta.date.is_some())).collect();

    for section in sections.values_mut() {
        if section.page_paths.is_empty() {
            continue;
        }
        let dated = section
            .page_paths
            .iter()
            .filter(|p| page_dates.get(p.as_str()).copied().unwrap_or(false))
            .count();
        let fraction = dated as f64 / section.page_paths.len() as f64;
        if section.metadata.get("kind").is_none() {
            section.kind = SectionKind::detect(None, &section.name, fraction);
        }
    }
}

pub fn relative_path(content_dir: &Path, path: &Path) -> String {
    path.strip_prefix(content_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
