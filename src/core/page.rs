//! Page data model.

use std::path::PathBuf;

use super::{Map, UrlPath, Value};

/// Parsed frontmatter plus the derived fields every page carries. Unknown
/// frontmatter keys land in `extra` rather than being rejected, since
/// themes are free to define their own page-level fields.
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub draft: bool,
    pub tags: Vec<String>,
    pub template: Option<String>,
    pub extra: Map,
}

impl PageMeta {
    pub fn from_value(value: &Value) -> Self {
        let mut extra = value.as_map().cloned().unwrap_or_default();
        let title = extra.remove("title").and_then(|v| v.as_str().map(String::from));
        let summary = extra.remove("summary").and_then(|v| v.as_str().map(String::from));
        let date = extra.remove("date").and_then(|v| v.as_str().map(String::from));
        let author = extra.remove("author").and_then(|v| v.as_str().map(String::from));
        let draft = extra
            .remove("draft")
            .map(|v| v.as_bool_or(false))
            .unwrap_or(false);
        let tags = extra
            .remove("tags")
            .map(|v| v.as_list_of_strings_or(vec![]))
            .unwrap_or_default();
        let template = extra.remove("template").and_then(|v| v.as_str().map(String::from));
        Self {
            title,
            summary,
            date,
            author,
            draft,
            tags,
            template,
            extra,
        }
    }
}

/// `source_path` (site-relative POSIX path) is the logical primary key
/// for a page across builds — it is what provenance records and the
/// incremental cache key on. `output_path` is only known once the site
/// tree has been finalized.
#[derive(Debug, Clone)]
pub struct Page {
    pub source_path: String,
    pub raw_content: String,
    pub meta: PageMeta,
    pub output_path: Option<PathBuf>,
    pub permalink: Option<UrlPath>,
    pub section_path: Option<String>,
    pub rendered_html: Option<String>,
    pub related_pages: Vec<String>,
}

impl Page {
    pub fn new(source_path: String, raw_content: String, meta: PageMeta) -> Self {
        Self {
            source_path,
            raw_content,
            meta,
            output_path: None,
            permalink: None,
            section_path: None,
            rendered_html: None,
            related_pages: Vec::new(),
        }
    }

    pub fn is_draft(&self) -> bool {
        self.meta.draft
    }

    pub fn title(&self) -> &str {
        self.meta
            .title
            .as_deref()
            .unwrap_or(self.source_path.as_str())
    }

    /// True for pages synthesized by the orchestrator (archives, tag
    /// pages) rather than discovered in `content/`.
    pub fn is_virtual(&self) -> bool {
        self.source_path.starts_with(".tola/generated/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_from_value_extracts_known_fields() {
        let mut map = Map::new();
        map.insert("title".into(), Value::String("Hello".into()));
        map.insert("draft".into(), Value::Bool(true));
        map.insert("tags".into(), Value::List(vec![Value::String("a".into())]));
        map.insert("custom".into(), Value::Int(42));

        let meta = PageMeta::from_value(&Value::Map(map));
        assert_eq!(meta.title.as_deref(), Some("Hello"));
        assert!(meta.draft);
        assert_eq!(meta.tags, vec!["a".to_string()]);
        assert_eq!(meta.extra.get("custom").unwrap().as_int_or(0), 42);
    }

    #[test]
    fn test_title_falls_back_to_source_path() {
        let page = Page::new("posts/a.md".into(), String::new(), PageMeta::default());
        assert_eq!(page.title(), "posts/a.md");
    }
}
