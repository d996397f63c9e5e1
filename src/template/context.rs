//! Context objects exposed to templates.

use serde::Serialize;

use crate::config::SiteConfig;
use crate::core::{Page, UrlPath};

#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub title: String,
    pub baseurl: String,
    pub description: String,
    pub author: String,
    pub language: String,
}

impl SiteView {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.site.title.clone(),
            baseurl: config.site.baseurl.clone(),
            description: config.site.description.clone(),
            author: config.site.author.clone(),
            language: config.site.language.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub title: String,
    pub summary: String,
    pub date: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub draft: bool,
    pub content: String,
    pub url: String,
}

impl PageView {
    /// `body_html` is the page's markdown body already rendered to HTML;
    /// it is distinct from `page.rendered_html`, which holds the
    /// *template's final output* and isn't populated until after this
    /// view is built.
    pub fn from_page(page: &Page, body_html: String) -> Self {
        Self {
            title: page.title().to_string(),
            summary: page.meta.summary.clone().unwrap_or_else(|| {
                crate::content::markdown::derive_summary(&body_html, 200)
            }),
            date: page.meta.date.clone(),
            author: page.meta.author.clone(),
            tags: page.meta.tags.clone(),
            draft: page.meta.draft,
            content: body_html,
            url: page
                .permalink
                .clone()
                .unwrap_or_else(|| UrlPath::from_page(&page.source_path))
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct BreadcrumbEntry {
    pub title: String,
    pub url: String,
}

/// Breadcrumbs from the root down to `section_path`, derived from the
/// flat section-path string (e.g. `"docs/guides"` -> `docs`, `docs/guides`).
pub fn breadcrumbs(section_path: &str) -> Vec<BreadcrumbEntry> {
    if section_path.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut acc = String::new();
    for segment in section_path.split('/') {
        if !acc.is_empty() {
            acc.push('/');
        }
        acc.push_str(segment);
        out.push(BreadcrumbEntry {
            title: segment.to_string(),
            url: UrlPath::from_page(&acc).to_string(),
        });
    }
    out
}
