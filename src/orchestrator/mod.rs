//! `BuildOrchestrator`: the fixed P1-P15 build phase pipeline.
//!
//! Each phase is a private function; [`run_build`] drives them in order,
//! enforcing each phase's failure policy (fatal aborts the whole build,
//! log-continue records a warning and the build proceeds) and reporting
//! per-phase timing through the `log!`/`debug!` macros.

mod menu;
mod related;
mod taxonomy;

pub use menu::MenuItem;
pub use taxonomy::TagIndex;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::debug_do;

use crate::asset::{self, AssetPipeline, ProcessFlags};
use crate::config::SiteConfig;
use crate::content;
use crate::core::{apply_baseurl, shutdown, BuildContext, Page, PageMeta, Section, SiteData, UrlPath};
use crate::generator;
use crate::hash::{hash_str, ContentHash};
use crate::incremental::{self, Decision, IncrementalContext};
use crate::provenance::{InputType, ProvenanceStore};
use crate::render::{self, RenderInputs, RenderOutcome};
use crate::template::TemplateRuntime;
use crate::{debug, log};

/// Summary of one `run_build` invocation, returned to the CLI layer.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages_rendered: usize,
    pub pages_cache_hit: usize,
    pub pages_failed: usize,
    pub assets_processed: usize,
    pub warnings: Vec<String>,
    pub elapsed_ms: u128,
}

/// Run one full build against `site`. `force_full` bypasses the
/// incremental decision table entirely (equivalent to R1: incremental
/// disabled), used by `tola build --full` and by the very first build
/// of a site (no cache to compare against).
pub fn run_build(site: &SiteData, force_full: bool) -> Result<BuildReport> {
    let build_start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // P1 Init
    let store = Arc::new(ProvenanceStore::load(&site.cache_dir));
    let config_hash = hash_str(&toml::to_string(&site.config).unwrap_or_default());
    let config_hash_path = site.cache_dir.join("config-hash.txt");
    let previous_config_hash = std::fs::read_to_string(&config_hash_path).ok();
    let config_hash_changed = previous_config_hash.as_deref() != Some(config_hash.to_hex_full().as_str());

    let incremental_enabled = site.config.build.cache_enabled && !force_full;
    let ctx = BuildContext::new(store.clone(), incremental_enabled);
    debug!("build"; "P1 init: incremental={incremental_enabled} config_hash_changed={config_hash_changed}");

    if shutdown::is_shutdown() {
        anyhow::bail!("build cancelled before starting");
    }

    // P2 Fonts (optional, supplemented)
    run_phase("fonts", || phase_fonts(site));

    // P3 Discovery
    run_fatal_phase("discovery", || phase_discovery(site, &ctx, &mut warnings))?;

    // P4 Incremental filter
    let manifest_path = site.output_dir.join("asset-manifest.json");
    let incr_ctx = IncrementalContext {
        incremental_enabled,
        config_hash_changed,
        output_dir: &site.output_dir,
        manifest_path: &manifest_path,
        autodoc_missing: false,
    };
    let force_all = force_full || matches!(incremental::global_decision(&incr_ctx), Some(Decision::FullRebuild));
    let runtime = build_template_runtime(site);
    run_fatal_phase("incremental-filter", || phase_incremental_filter(site, &ctx, &runtime, config_hash, force_all))?;

    // P5 Section finalization
    run_fatal_phase("sections", || phase_finalize_sections(&ctx))?;

    // P6 Taxonomies
    let tag_index_path = site.cache_dir.join("taxonomy").join("tags.json");
    run_fatal_phase("taxonomy", || phase_taxonomies(&ctx, &tag_index_path, force_all))?;

    // P7 Menus
    let menu = run_fatal_phase("menus", || phase_menus(&ctx, &site.config))?;

    // P8 Related posts index
    run_phase("related", || phase_related(&ctx));

    // P9 Assets (parallelizable)
    let assets_processed = run_fatal_phase("assets", || phase_assets(site, &ctx, force_all))?;

    // P10 Render (parallelizable)
    let (rendered, cache_hit, failed) =
        run_policy_phase("render", site.config.build.strict_mode, || phase_render(site, &ctx, &runtime, config_hash, &mut warnings))?;

    // P11 Site-pages reconciliation
    run_fatal_phase("reconcile", || phase_reconcile(&ctx))?;

    // P12 Asset-dependency persistence
    run_phase("asset-deps", || phase_persist_asset_deps(site, &ctx));

    // P13 Postprocess (parallelizable across outputs)
    run_phase("postprocess", || phase_postprocess(site, &ctx, &menu));

    // P14 Cache save
    run_fatal_phase("cache-save", || phase_cache_save(site, &store, &config_hash_path, config_hash))?;

    // P15 Health check
    run_policy_phase("health-check", site.config.health_check.strict_mode, || {
        phase_health_check(site, &ctx, &mut warnings)
    })?;

    let elapsed_ms = build_start.elapsed().as_millis();
    log!("build"; "done in {elapsed_ms}ms: {rendered} rendered, {cache_hit} cached, {failed} failed, {assets_processed} assets");

    Ok(BuildReport {
        pages_rendered: rendered,
        pages_cache_hit: cache_hit,
        pages_failed: failed,
        assets_processed,
        warnings,
        elapsed_ms,
    })
}

/// Run a log-continue phase: errors are swallowed and logged, never
/// propagated.
fn run_phase<T>(name: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    debug!("build"; "phase {name} took {}ms", start.elapsed().as_millis());
    result
}

/// Run a fatal phase: any `Err` aborts the whole build.
fn run_fatal_phase<T>(name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = f().with_context(|| format!("phase {name} failed"));
    debug!("build"; "phase {name} took {}ms", start.elapsed().as_millis());
    result
}

/// Run a phase whose failure policy depends on strict mode: fatal when
/// `strict`, log-continue (return the fallback) otherwise.
fn run_policy_phase<T: Default>(name: &str, strict: bool, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = f();
    debug!("build"; "phase {name} took {}ms", start.elapsed().as_millis());
    match result {
        Ok(v) => Ok(v),
        Err(e) if strict => Err(e.context(format!("phase {name} failed (strict mode)"))),
        Err(e) => {
            log!("build"; "phase {name} failed, continuing (non-strict): {e}");
            Ok(T::default())
        }
    }
}

fn phase_fonts(site: &SiteData) {
    let Some(css) = asset::fonts::render_font_css(&site.config.build.fonts) else {
        return;
    };
    if let Err(e) = crate::atomic_io::write_text(&site.assets_dir.join("_fonts.css"), &css) {
        log!("fonts"; "failed to write generated font css: {e}");
    }
}

fn phase_discovery(site: &SiteData, ctx: &BuildContext, warnings: &mut Vec<String>) -> Result<()> {
    let discovery = content::discover(&site.content_dir, site.config.build.strict_mode)
        .context("content discovery failed")?;
    for err in &discovery.errors {
        warnings.push(err.to_string());
    }
    for section in discovery.sections {
        ctx.sections.insert(section.path.clone(), section);
    }
    for page in discovery.pages {
        ctx.pages.insert(page.source_path.clone(), page);
    }
    for a in asset::discover_assets(&site.assets_dir) {
        ctx.assets.insert(a.logical_path.clone(), a);
    }
    Ok(())
}

fn build_template_runtime(site: &SiteData) -> TemplateRuntime {
    TemplateRuntime::new(vec![site.theme_dir(), site.templates_dir.clone()])
        .with_images(&site.cache_dir, site.assets_dir.clone())
        .with_data(site.data_dir.clone())
}

/// Find every template, partial, and data file any page's last render
/// actually touched whose on-disk content no longer matches the hash that
/// was recorded for it, and fan each one out to its dependent pages via
/// the subvenance index. This is what invalidates a page whose template
/// uses `{% include %}`/`{% extends %}`/`data()`, since the pre-render
/// probe computed in `phase_incremental_filter`'s loop has no way to know
/// about those reads ahead of time.
fn fan_out_stale_dependencies(store: &ProvenanceStore, runtime: &TemplateRuntime, data_dir: &Path) -> HashSet<String> {
    let tracked = store.tracked_inputs(&[InputType::Template, InputType::Partial, InputType::Data]);
    let changed_old_hashes: Vec<ContentHash> = tracked
        .into_iter()
        .filter_map(|((input_type, logical_path), old_hash)| {
            let current_hash = match input_type {
                InputType::Data => read_data_file_hash(data_dir, &logical_path),
                _ => runtime
                    .resolved_path(&logical_path)
                    .and_then(|p| std::fs::read_to_string(p).ok())
                    .map(|s| hash_str(&s)),
            };
            (current_hash != Some(old_hash)).then_some(old_hash)
        })
        .collect();
    incremental::fan_out_affected(store, &changed_old_hashes)
}

fn read_data_file_hash(data_dir: &Path, logical_path: &str) -> Option<ContentHash> {
    for ext in ["json", "toml"] {
        let path = data_dir.join(format!("{logical_path}.{ext}"));
        if let Ok(source) = std::fs::read_to_string(path) {
            return Some(hash_str(&source));
        }
    }
    None
}

/// P4: decide, per page, whether it needs rendering (R1-R7), and which
/// assets need reprocessing. Populates `ctx.pages_to_build` and
/// `ctx.assets_to_process`.
fn phase_incremental_filter(
    site: &SiteData,
    ctx: &BuildContext,
    runtime: &TemplateRuntime,
    config_hash: crate::hash::ContentHash,
    force_all: bool,
) -> Result<()> {
    let forced_rebuild = if force_all {
        HashSet::new()
    } else {
        fan_out_stale_dependencies(&ctx.provenance, runtime, &site.data_dir)
    };
    for page_id in &forced_rebuild {
        ctx.forced_rebuild.insert(page_id.clone());
    }

    let mut to_build = Vec::new();
    for entry in ctx.pages.iter() {
        let page = entry.value();
        if force_all {
            to_build.push(page.source_path.clone());
            continue;
        }
        let section = page
            .section_path
            .as_deref()
            .and_then(|p| ctx.sections.get(p))
            .map(|s| s.clone());
        let inputs = RenderInputs {
            config: &site.config,
            config_hash,
            section: section.as_ref(),
            runtime,
            store: &ctx.provenance,
            known_stale: false,
        };
        let (_, provenance) = render::compute_provenance(page, &inputs);
        let decision = incremental::page_decision(&page.source_path, &provenance, &ctx.provenance, &forced_rebuild);
        if decision == Decision::CacheMiss {
            to_build.push(page.source_path.clone());
        }
    }
    debug_do! {
        debug!("build"; "incremental filter: {}/{} pages need rendering", to_build.len(), ctx.pages.len());
    }
    *ctx.pages_to_build.lock() = to_build;

    let previous_manifest = crate::manifest::AssetManifest::load(&site.output_dir.join("asset-manifest.json"));
    for entry in ctx.assets.iter() {
        let asset = entry.value();
        if force_all {
            ctx.assets_to_process.insert(asset.logical_path.clone());
            continue;
        }
        let current_fingerprint = std::fs::read(&asset.source_path)
            .ok()
            .map(|bytes| crate::hash::hash_bytes(&bytes).to_fingerprint());
        let previous_fingerprint = previous_manifest
            .as_ref()
            .and_then(|m| m.get(&asset.logical_path))
            .and_then(|e| e.fingerprint.clone());
        if current_fingerprint != previous_fingerprint {
            ctx.assets_to_process.insert(asset.logical_path.clone());
        }
    }
    Ok(())
}

/// P5: ensure every non-root section has an `index_page`, synthesizing a
/// virtual archive page (`.tola/generated/<path>/_index.md`) where one
/// wasn't authored.
fn phase_finalize_sections(ctx: &BuildContext) -> Result<()> {
    let paths: Vec<String> = ctx.sections.iter().map(|e| e.key().clone()).collect();
    for path in paths {
        let needs_synthesis = match ctx.sections.get(&path) {
            Some(section) => !section.is_root() && section.index_page.is_none(),
            None => false,
        };
        if !needs_synthesis {
            continue;
        }
        let virtual_path = format!(".tola/generated/{path}/_index.md");
        if let Some(mut section) = ctx.sections.get_mut(&path) {
            section.index_page = Some(virtual_path.clone());
        }
        let name = ctx.sections.get(&path).map(|s| s.name.clone()).unwrap_or_default();
        let mut meta = PageMeta {
            title: Some(display_title(&name)),
            template: Some("archive.html".to_string()),
            ..PageMeta::default()
        };
        meta.extra.insert("section".into(), crate::core::Value::String(path.clone()));
        let mut page = Page::new(virtual_path.clone(), String::new(), meta);
        page.section_path = Some(path);
        ctx.pages.insert(virtual_path, page);
    }
    Ok(())
}

fn display_title(name: &str) -> String {
    let mut chars: Vec<char> = name.replace(['-', '_'], " ").chars().collect();
    if let Some(first) = chars.first_mut() {
        *first = first.to_ascii_uppercase();
    }
    chars.into_iter().collect()
}

fn phase_taxonomies(ctx: &BuildContext, index_path: &Path, force_all: bool) -> Result<()> {
    let all_pages: Vec<Page> = ctx.pages.iter().map(|e| e.value().clone()).collect();
    let all_refs: Vec<&Page> = all_pages.iter().collect();

    let index = if force_all || !index_path.exists() {
        TagIndex::rebuild_full(&all_refs)
    } else {
        let mut index = TagIndex::load(index_path);
        let changed: Vec<&Page> = all_pages
            .iter()
            .filter(|p| ctx.changed_page_paths.contains(&p.source_path))
            .collect();
        index.patch(&changed);
        index
    };

    for tag in index.tags() {
        ctx.affected_tags.insert(tag.clone());
    }
    index.save(index_path).context("failed to persist tag index")
}

fn phase_menus(ctx: &BuildContext, config: &SiteConfig) -> Result<Vec<MenuItem>> {
    let snapshot: HashMap<String, Section> = ctx.sections.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
    Ok(menu::build(&snapshot, &config.site.baseurl))
}

fn phase_related(ctx: &BuildContext) {
    let pages: Vec<Page> = ctx.pages.iter().map(|e| e.value().clone()).collect();
    let refs: Vec<&Page> = pages.iter().collect();
    let related = related::compute(&refs);
    for (source_path, related_paths) in related {
        if let Some(mut page) = ctx.pages.get_mut(&source_path) {
            page.related_pages = related_paths;
        }
    }
}

fn phase_assets(site: &SiteData, ctx: &BuildContext, force_all: bool) -> Result<usize> {
    let all_assets: Vec<crate::core::Asset> = ctx.assets.iter().map(|e| e.value().clone()).collect();
    let selected: Vec<crate::core::Asset> = if force_all {
        all_assets
    } else {
        all_assets.into_iter().filter(|a| ctx.assets_to_process.contains(&a.logical_path)).collect()
    };

    let js_config = if site.config.assets.bundle_js {
        let mut modules: Vec<String> = selected
            .iter()
            .filter(|a| a.kind == crate::core::AssetKind::JavaScript)
            .map(|a| a.logical_path.clone())
            .collect();
        modules.sort();
        Some(asset::js::JsBundleConfig { modules, excluded: Vec::new() })
    } else {
        None
    };

    let flags = ProcessFlags {
        minify: site.config.assets.minify,
        optimize: site.config.assets.optimize && site.config.css.optimize,
        fingerprint: site.config.assets.fingerprint,
        bundle_js: site.config.assets.bundle_js,
    };
    let pipeline = AssetPipeline::new(&site.output_dir, flags);
    let processed = selected.len();
    let manifest = pipeline.run(&selected, js_config.as_ref());
    pipeline.write_manifest(&manifest).context("failed to write asset manifest")?;

    let mut stats = ctx.stats.lock();
    stats.assets_processed = processed;
    Ok(processed)
}

/// `(rendered, cache_hit, failed)`.
fn phase_render(
    site: &SiteData,
    ctx: &BuildContext,
    runtime: &TemplateRuntime,
    config_hash: crate::hash::ContentHash,
    warnings: &mut Vec<String>,
) -> Result<(usize, usize, usize)> {
    let page_ids = ctx.pages_to_build.lock().clone();
    let failures: Vec<(String, String)> = page_ids
        .par_iter()
        .filter_map(|page_id| {
            if shutdown::is_shutdown() {
                return None;
            }
            let mut page = ctx.pages.get_mut(page_id)?;
            let section = page
                .section_path
                .as_deref()
                .and_then(|p| ctx.sections.get(p))
                .map(|s| s.clone());
            let (url, rel_output) = page_route(page_id);
            let permalink = apply_baseurl(&site.config.site.baseurl, &url);
            page.permalink = Some(UrlPath::from_page(&permalink));
            let output_path = site.output_dir.join(&rel_output);

            let inputs = RenderInputs {
                config: &site.config,
                config_hash,
                section: section.as_ref(),
                runtime,
                store: &ctx.provenance,
                known_stale: ctx.forced_rebuild.contains(page_id),
            };

            match render::render_page(&mut page, output_path, &inputs) {
                RenderOutcome::Rendered { .. } => {
                    if let Some(html) = page.rendered_html.clone() {
                        ctx.accumulated_page_assets.insert(page_id.clone(), render::extract_asset_references(&html));
                    }
                    ctx.changed_page_paths.insert(page_id.clone());
                    None
                }
                RenderOutcome::CacheHit => None,
                RenderOutcome::Failed(msg) => Some((page_id.clone(), msg)),
            }
        })
        .collect();

    let failed = failures.len();
    for (page_id, msg) in &failures {
        warnings.push(format!("render failed for {page_id}: {msg}"));
    }

    let cache_hit = page_ids.len() - failed - ctx.changed_page_paths.len().min(page_ids.len());
    let rendered = ctx.changed_page_paths.len();

    let mut stats = ctx.stats.lock();
    stats.pages_rendered = rendered;
    stats.pages_cache_hit = cache_hit;
    stats.pages_failed = failed;

    if failed > 0 {
        anyhow::bail!("{failed} page(s) failed to render");
    }
    Ok((rendered, cache_hit, failed))
}

/// Site-relative URL and output-relative path for a page's source path.
/// `_index.md` files (including synthesized ones under
/// `.tola/generated/`) map to their directory's `index.html`. Each path
/// segment is slugified so a source file named with spaces or mixed case
/// still produces a clean URL.
fn page_route(source_path: &str) -> (String, PathBuf) {
    let logical = source_path.strip_prefix(".tola/generated/").unwrap_or(source_path);
    let stem = logical.trim_end_matches(".markdown").trim_end_matches(".md");
    let dir = if stem == "_index" || stem.ends_with("/_index") {
        stem.trim_end_matches("_index").trim_end_matches('/')
    } else {
        stem
    };
    let dir = crate::utils::path::slug::slugify_path(dir);

    let url = if dir.is_empty() { "/".to_string() } else { format!("/{dir}/") };
    let rel_output = if dir.is_empty() { PathBuf::from("index.html") } else { Path::new(&dir).join("index.html") };
    (url, rel_output)
}

fn phase_reconcile(ctx: &BuildContext) -> Result<()> {
    let page_ids = ctx.pages_to_build.lock().clone();
    for id in &page_ids {
        if !ctx.pages.contains_key(id) {
            anyhow::bail!("page {id} vanished from the build context during rendering");
        }
    }
    Ok(())
}

fn phase_persist_asset_deps(site: &SiteData, ctx: &BuildContext) {
    let snapshot: std::collections::BTreeMap<String, Vec<String>> =
        ctx.accumulated_page_assets.iter().map(|e| (e.key().clone(), e.value().clone())).collect();
    let Ok(json) = serde_json::to_string_pretty(&snapshot) else {
        return;
    };
    if let Err(e) = crate::atomic_io::write_text(&site.cache_dir.join("page-assets.json"), &json) {
        log!("build"; "failed to persist asset-dependency map: {e}");
    }
}

fn phase_postprocess(site: &SiteData, ctx: &BuildContext, _menu: &[MenuItem]) {
    let pages: Vec<Page> = ctx.pages.iter().map(|e| e.value().clone()).collect();
    let refs: Vec<&Page> = pages.iter().collect();

    let (sitemap, (feed, versions)) = rayon::join(
        || generator::write_sitemap(&refs, &site.config, &site.output_dir),
        || {
            rayon::join(
                || generator::write_feed(&refs, &site.config, &site.output_dir),
                || generator::write_versions_json(&site.config.versioning, &[], &site.output_dir),
            )
        },
    );
    let default_prefix = site.config.versioning.deploy_prefix.as_deref().unwrap_or("/");
    let redirect = generator::write_root_redirect(&site.config.versioning, default_prefix, &site.output_dir);

    for (name, result) in [("sitemap", sitemap), ("rss", feed), ("versions", versions), ("redirect", redirect)] {
        if let Err(e) = result {
            log!("postprocess"; "{name} generation failed: {e}");
        }
    }
}

fn phase_cache_save(
    site: &SiteData,
    store: &ProvenanceStore,
    config_hash_path: &Path,
    config_hash: crate::hash::ContentHash,
) -> Result<()> {
    store.save().context("failed to persist provenance store")?;
    crate::atomic_io::write_text(config_hash_path, &config_hash.to_hex_full())
        .context("failed to persist config hash")?;
    let _ = &site.cache_dir;
    Ok(())
}

fn phase_health_check(site: &SiteData, ctx: &BuildContext, warnings: &mut Vec<String>) -> Result<()> {
    if !site.config.health_check.enabled {
        return Ok(());
    }
    let mut broken = Vec::new();
    for entry in ctx.accumulated_page_assets.iter() {
        let page_id = entry.key();
        for url in entry.value() {
            let rel = url.trim_start_matches('/');
            if rel.is_empty() || !site.output_dir.join(rel).exists() {
                if !rel.is_empty() {
                    broken.push(format!("{page_id}: missing linked asset {url}"));
                }
            }
        }
    }
    if broken.is_empty() {
        return Ok(());
    }
    if site.config.health_check.strict_mode {
        anyhow::bail!("health check found {} broken reference(s):\n{}", broken.len(), broken.join("\n"));
    }
    warnings.extend(broken);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_route_flat_page() {
        let (url, rel) = page_route("about.md");
        assert_eq!(url, "/about/");
        assert_eq!(rel, PathBuf::from("about/index.html"));
    }

    #[test]
    fn test_page_route_section_index() {
        let (url, rel) = page_route("blog/_index.md");
        assert_eq!(url, "/blog/");
        assert_eq!(rel, PathBuf::from("blog/index.html"));
    }

    #[test]
    fn test_page_route_root_index() {
        let (url, rel) = page_route("_index.md");
        assert_eq!(url, "/");
        assert_eq!(rel, PathBuf::from("index.html"));
    }

    #[test]
    fn test_page_route_synthesized_archive() {
        let (url, rel) = page_route(".tola/generated/blog/_index.md");
        assert_eq!(url, "/blog/");
        assert_eq!(rel, PathBuf::from("blog/index.html"));
    }

    #[test]
    fn test_page_route_slugifies_segments() {
        let (url, rel) = page_route("Getting Started/My First Post.md");
        assert_eq!(url, "/getting-started/my-first-post/");
        assert_eq!(rel, PathBuf::from("getting-started/my-first-post/index.html"));
    }

    #[test]
    fn test_display_title_replaces_separators() {
        assert_eq!(display_title("api-reference"), "Api reference");
    }
}
