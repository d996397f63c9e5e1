//! `sitemap.xml` generation: one `<url>` entry per publishable page.

use std::fmt::Write as _;
use std::path::Path;

use crate::atomic_io;
use crate::config::SiteConfig;
use crate::core::Page;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub fn write_sitemap(pages: &[&Page], config: &SiteConfig, output_dir: &Path) -> std::io::Result<()> {
    let base_url = config.site.baseurl.trim_end_matches('/');
    let xml = build_urlset(pages, base_url);
    atomic_io::write_text(&output_dir.join("sitemap.xml"), &xml)
}

fn build_urlset(pages: &[&Page], base_url: &str) -> String {
    let mut out = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"{SITEMAP_NS}\">\n");
    for page in pages.iter().filter(|p| !p.is_draft() && !p.is_virtual()) {
        let path = page.permalink.as_ref().map(|u| u.as_str()).unwrap_or_default();
        let loc = escape_xml_text(&format!("{base_url}{path}"));
        let entry = match &page.meta.date {
            Some(date) => format!("  <url>\n    <loc>{loc}</loc>\n    <lastmod>{date}</lastmod>\n  </url>\n"),
            None => format!("  <url>\n    <loc>{loc}</loc>\n  </url>\n"),
        };
        let _ = out.write_str(&entry);
    }
    out.push_str("</urlset>\n");
    out
}

/// Single-pass replacement of the five XML-reserved characters. Unlike a
/// sequential chain of `str::replace` calls, this never re-scans text
/// already copied into the output.
fn escape_xml_text(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
