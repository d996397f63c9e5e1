//! `AssetPipeline`: classify, bundle, minify, fingerprint, and
//! write assets, populating an [`AssetManifest`] along the way.

pub mod css;
pub mod fonts;
pub mod js;

use std::path::Path;

use jwalk::WalkDir;

use crate::atomic_io;
use crate::core::{Asset, AssetKind};
use crate::hash::hash_bytes;
use crate::manifest::AssetManifest;

/// Walk `assets_dir` and build an [`Asset`] entry for every file found,
/// with `logical_path` relative to `assets_dir`.
pub fn discover_assets(assets_dir: &Path) -> Vec<Asset> {
    if !assets_dir.exists() {
        return Vec::new();
    }
    let mut assets = Vec::new();
    for entry in WalkDir::new(assets_dir).sort(true) {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let logical_path = path
            .strip_prefix(assets_dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        assets.push(Asset::discover(path, logical_path));
    }
    assets
}

pub struct ProcessFlags {
    pub minify: bool,
    pub optimize: bool,
    pub fingerprint: bool,
    pub bundle_js: bool,
}

pub struct AssetPipeline<'a> {
    output_dir: &'a Path,
    flags: ProcessFlags,
}

impl<'a> AssetPipeline<'a> {
    pub fn new(output_dir: &'a Path, flags: ProcessFlags) -> Self {
        Self { output_dir, flags }
    }

    /// Process every asset, writing final output via [`atomic_io`] and
    /// returning a populated manifest. Per-asset failures are logged and
    /// the asset is skipped (no asset failure aborts the whole pipeline).
    pub fn run(&self, assets: &[Asset], js_config: Option<&js::JsBundleConfig>) -> AssetManifest {
        let mut manifest = AssetManifest::new();
        let assets_out_dir = self.output_dir.join("assets");

        let excluded_from_copy: Vec<&str> = js_config
            .map(|c| c.modules.iter().map(String::as_str).collect())
            .unwrap_or_default();

        for asset in assets {
            if asset.kind == AssetKind::Css && asset.is_css_entry {
                self.process_css_entry(asset, &assets_out_dir, &mut manifest);
                continue;
            }
            if asset.kind == AssetKind::Css {
                continue; // CSS modules are only emitted via an entry point's bundle
            }
            if asset.kind == AssetKind::JavaScript
                && self.flags.bundle_js
                && excluded_from_copy.iter().any(|m| asset.logical_path.ends_with(*m))
            {
                continue; // folded into the bundle instead of copied directly
            }
            self.process_plain(asset, &assets_out_dir, &mut manifest);
        }

        if self.flags.bundle_js {
            if let Some(config) = js_config {
                self.process_js_bundle(config, &assets_out_dir, &mut manifest);
            }
        }

        manifest
    }

    fn process_css_entry(&self, asset: &Asset, assets_out_dir: &Path, manifest: &mut AssetManifest) {
        let mut content = css::bundle(&asset.source_path);
        if self.flags.optimize {
            // Tree-shake against the classes/ids the *previous* build's HTML
            // actually used — the only reference manifest available before
            // this build's own pages are rendered.
            let used = css::collect_used_selectors(self.output_dir);
            content = css::optimize(&content, &used);
        }
        if self.flags.minify {
            match css::minify(&content) {
                Ok(minified) => content = minified,
                Err(_) => { /* AssetError::MinifyFallback: keep unminified content */ }
            }
        }
        self.write_and_record(asset.logical_path.clone(), content.into_bytes(), assets_out_dir, manifest);
    }

    fn process_js_bundle(&self, config: &js::JsBundleConfig, assets_out_dir: &Path, manifest: &mut AssetManifest) {
        let source_dir = assets_out_dir; // modules are plain-copied assets already resolved relative to assets/
        let mut content = js::bundle(source_dir, config);
        if self.flags.minify {
            match js::minify(&content) {
                Ok(minified) => content = minified,
                Err(_) => {}
            }
        }
        self.write_and_record("js/bundle.js".to_string(), content.into_bytes(), assets_out_dir, manifest);
    }

    fn process_plain(&self, asset: &Asset, assets_out_dir: &Path, manifest: &mut AssetManifest) {
        let Ok(bytes) = std::fs::read(&asset.source_path) else {
            return;
        };
        self.write_and_record(asset.logical_path.clone(), bytes, assets_out_dir, manifest);
    }

    fn write_and_record(
        &self,
        logical_path: String,
        content: Vec<u8>,
        assets_out_dir: &Path,
        manifest: &mut AssetManifest,
    ) {
        let fingerprint = if self.flags.fingerprint {
            Some(hash_bytes(&content).to_fingerprint())
        } else {
            None
        };
        let final_rel = match &fingerprint {
            Some(fp) => fingerprinted_name(&logical_path, fp),
            None => logical_path.clone(),
        };
        let dest = assets_out_dir.join(&final_rel);

        if fingerprint.is_some() {
            remove_stale_siblings(&dest);
        }

        if atomic_io::write_bytes(&dest, &content).is_err() {
            return;
        }

        manifest.set_entry(
            logical_path,
            format!("assets/{final_rel}"),
            fingerprint,
            Some(content.len() as u64),
            None,
        );
    }

    pub fn write_manifest(&self, manifest: &AssetManifest) -> std::io::Result<()> {
        manifest.write(&self.output_dir.join("asset-manifest.json"))
    }
}

fn fingerprinted_name(logical_path: &str, fingerprint: &str) -> String {
    let path = Path::new(logical_path);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("asset");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    let filename = if ext.is_empty() {
        format!("{stem}.{fingerprint}")
    } else {
        format!("{stem}.{fingerprint}.{ext}")
    };
    if parent.is_empty() {
        filename
    } else {
        format!("{parent}/{filename}")
    }
}

/// Remove earlier fingerprinted siblings of `dest` (same stem, same
/// extension, same directory) before writing the new one.
fn remove_stale_siblings(dest: &Path) {
    let Some(dir) = dest.parent() else { return };
    let Some(dest_name) = dest.file_name().and_then(|n| n.to_str()) else { return };
    let Some((stem, ext)) = split_fingerprinted(dest_name) else { return };

    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == dest_name {
            continue;
        }
        if let Some((other_stem, other_ext)) = split_fingerprinted(name) {
            if other_stem == stem && other_ext == ext {
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}

/// Split `stem.fingerprint.ext` into `(stem, ext)`, ignoring the
/// fingerprint segment.
fn split_fingerprinted(filename: &str) -> Option<(String, String)> {
    let mut parts: Vec<&str> = filename.split('.').collect();
    if parts.len() < 3 {
        return None;
    }
    let ext = parts.pop()?;
    parts.pop()?; // fingerprint
    Some((parts.join("."), ext.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprinted_name_preserves_directory() {
        assert_eq!(fingerprinted_name("css/style.css", "abcd1234"), "css/style.abcd1234.css");
    }

    #[test]
    fn test_run_plain_asset_populates_manifest() {
        let dir = TempDir::new().unwrap();
        let src_dir = dir.path().join("src");
        std::fs::create_dir_all(&src_dir).unwrap();
        std::fs::write(src_dir.join("logo.png"), b"fakepng").unwrap();

        let asset = Asset::discover(src_dir.join("logo.png"), "logo.png".into());
        let pipeline = AssetPipeline::new(
            dir.path(),
            ProcessFlags { minify: false, optimize: false, fingerprint: true, bundle_js: false },
        );
        let manifest = pipeline.run(&[asset], None);
        let entry = manifest.get("logo.png").unwrap();
        assert!(entry.output_path.starts_with("assets/logo."));
    }

    #[test]
    fn test_css_entry_optimize_drops_selectors_unused_in_prior_output() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<div class=\"card\">hi</div>").unwrap();
        let src_dir = dir.path().join("src");
        std::fs::create_dir_all(&src_dir).unwrap();
        std::fs::write(src_dir.join("style.css"), ".card { color: red; }\n.unused { color: blue; }").unwrap();

        let mut asset = Asset::discover(src_dir.join("style.css"), "style.css".into());
        asset.is_css_entry = true;
        let pipeline = AssetPipeline::new(
            dir.path(),
            ProcessFlags { minify: false, optimize: true, fingerprint: false, bundle_js: false },
        );
        pipeline.run(&[asset], None);

        let written = std::fs::read_to_string(dir.path().join("assets/style.css")).unwrap();
        assert!(written.contains(".card"));
        assert!(!written.contains(".unused"));
    }

    #[test]
    fn test_discover_assets_relative_logical_paths() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("css")).unwrap();
        std::fs::write(dir.path().join("css/style.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("favicon.ico"), b"x").unwrap();

        let assets = discover_assets(dir.path());
        let paths: Vec<&str> = assets.iter().map(|a| a.logical_path.as_str()).collect();
        assert!(paths.contains(&"css/style.css"));
        assert!(paths.contains(&"favicon.ico"));
    }

    #[test]
    fn test_discover_assets_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover_assets(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_stale_fingerprinted_sibling_removed() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(&dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.oldhash1.js"), b"old").unwrap();

        let dest = dir.path().join("assets/app.newhash2.js");
        std::fs::write(&dest, b"new").unwrap();
        remove_stale_siblings(&dest);

        assert!(!dir.path().join("assets/app.oldhash1.js").exists());
        assert!(dest.exists());
    }
}
