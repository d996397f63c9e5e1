//! `RenderingPipeline`: the six-step per-page render contract.

use std::path::PathBuf;

use crate::atomic_io;
use crate::config::SiteConfig;
use crate::core::{Page, Section, Value};
use crate::hash::{hash_bytes, hash_mapping, hash_str, ContentHash};
use crate::provenance::{InputRecord, InputType, Provenance, ProvenanceCollector, ProvenanceStore};
use crate::template::context::{PageView, SiteView};
use crate::template::TemplateRuntime;
use crate::utils::path::route::{is_external_link, split_path_fragment};

#[derive(Debug)]
pub enum RenderOutcome {
    CacheHit,
    Rendered { output_hash: ContentHash },
    Failed(String),
}

/// Everything a single page render needs that isn't already on the `Page`
/// itself. Threaded explicitly rather than pulled from ambient state.
pub struct RenderInputs<'a> {
    pub config: &'a SiteConfig,
    pub config_hash: ContentHash,
    pub section: Option<&'a Section>,
    pub runtime: &'a TemplateRuntime,
    pub store: &'a ProvenanceStore,
    /// `true` if the incremental filter already determined this page is
    /// stale via subvenance fan-out (a partial/`data()` dependency changed
    /// that the pre-render probe can't see). Skips the redundant freshness
    /// recheck below, which would otherwise wrongly report a cache hit.
    pub known_stale: bool,
}

/// Run the per-page contract. On cache-hit or failure, `page.rendered_html`
/// and `page.output_path` are left as they were; on success they're
/// populated and the output is written through [`atomic_io`].
/// Compute the seed provenance (content, frontmatter, config, section,
/// template hashes) for a page without rendering it. Shared by
/// `render_page` and by the incremental filter phase, which needs the
/// same provenance to decide R5-R7 before committing to a render.
pub fn compute_provenance(page: &Page, inputs: &RenderInputs) -> (String, Provenance) {
    let content_hash = hash_str(&page.raw_content);
    let frontmatter_value = page_frontmatter_value(page);
    let frontmatter_hash = hash_mapping(&frontmatter_value);
    let section_hash = inputs
        .section
        .map(|s| hash_mapping(&s.metadata))
        .unwrap_or(ContentHash::EMPTY);
    let template_name = page.meta.template.clone().unwrap_or_else(|| "page.html".to_string());
    let template_hash = inputs
        .runtime
        .resolved_path(&template_name)
        .and_then(|p| std::fs::read_to_string(p).ok())
        .map(|s| hash_str(&s));

    let mut seed = vec![
        InputRecord::new(InputType::Content, page.source_path.clone(), content_hash),
        InputRecord::new(InputType::Metadata, page.source_path.clone(), frontmatter_hash),
        InputRecord::new(InputType::Config, "site.toml", inputs.config_hash),
    ];
    if let Some(section) = inputs.section {
        seed.push(InputRecord::new(InputType::Section, section.path.clone(), section_hash));
    }
    if let Some(hash) = template_hash {
        seed.push(InputRecord::new(InputType::Template, template_name.clone(), hash));
    }
    (template_name, Provenance::from_inputs(seed))
}

pub fn render_page(page: &mut Page, output_path: PathBuf, inputs: &RenderInputs) -> RenderOutcome {
    let page_id = page.source_path.clone();
    let (template_name, initial_provenance) = compute_provenance(page, inputs);

    if !inputs.known_stale && inputs.store.is_fresh(&page_id, &initial_provenance) {
        return RenderOutcome::CacheHit;
    }

    let collector = ProvenanceCollector::seed(initial_provenance.inputs.clone());
    let context = build_context(page, inputs.config);

    let html = match inputs.runtime.render(&template_name, context, &collector) {
        Ok(html) => html,
        Err(e) => return RenderOutcome::Failed(e.to_string()),
    };

    let output_hash = hash_bytes(html.as_bytes());
    if let Err(e) = atomic_io::write_text(&output_path, &html) {
        return RenderOutcome::Failed(e.to_string());
    }

    page.rendered_html = Some(html);
    page.output_path = Some(output_path);

    let provenance = collector.finish();
    inputs.store.store(crate::provenance::ProvenanceRecord {
        page_id,
        provenance,
        output_hash,
        created_at: crate::utils::date::DateTimeUtc::now_utc().to_rfc3339(),
        build_id: None,
    });

    RenderOutcome::Rendered { output_hash }
}

fn page_frontmatter_value(page: &Page) -> Value {
    let mut map = page.meta.extra.clone();
    if let Some(title) = &page.meta.title {
        map.insert("title".into(), Value::String(title.clone()));
    }
    Value::Map(map)
}

fn build_context(page: &Page, config: &SiteConfig) -> minijinja::Value {
    let site = SiteView::from_config(config);
    let body_html = crate::content::markdown::render_to_html(&page.raw_content);
    let page_view = PageView::from_page(page, body_html.clone());
    minijinja::context! { site => site, page => page_view, content => body_html }
}

/// Extract asset URLs referenced in rendered HTML (`src=`/`href=`
/// attribute values), for the per-page asset-dependency tracking
/// accumulated into `BuildContext`. A small attribute scan
/// rather than a full HTML parse, since only literal attribute values
/// matter here.
pub fn extract_asset_references(html: &str) -> Vec<String> {
    let mut refs = Vec::new();
    for attr in ["src=\"", "href=\""] {
        let mut rest = html;
        while let Some(start) = rest.find(attr) {
            rest = &rest[start + attr.len()..];
            if let Some(end) = rest.find('"') {
                let value = &rest[..end];
                let (path, _fragment) = split_path_fragment(value);
                if !path.is_empty() && !is_external_link(path) {
                    refs.push(path.to_string());
                }
                rest = &rest[end + 1..];
            } else {
                break;
            }
        }
    }
    refs
}
