//! `tola init`: scaffold a minimal site directory so a new user has
//! something buildable immediately.

use std::path::Path;

use anyhow::{Context, Result};

use crate::atomic_io;
use crate::log;

const DEFAULT_CONFIG: &str = r#"[site]
title = "My Site"
baseurl = ""
description = ""
language = "en"

[build]
output_dir = "public"
content_dir = "content"
cache_enabled = true
"#;

const INDEX_CONTENT: &str = "---\ntitle: Home\n---\n# Hello\n\nWelcome to your new site.\n";

const PAGE_TEMPLATE: &str = "<!doctype html>\n<html lang=\"{{ site.language }}\">\n<head><meta charset=\"utf-8\"><title>{{ page.title }}</title></head>\n<body>\n<h1>{{ page.title }}</h1>\n{{ content }}\n</body>\n</html>\n";

const STYLE_CSS: &str = "body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 40rem; }\n";

/// Write a fresh site skeleton at `dir`. Refuses to touch a directory that
/// already contains a config file, so `tola init` never clobbers existing
/// work.
pub fn new_site(dir: &Path, dry_run: bool) -> Result<()> {
    let config_path = dir.join("tola.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists; refusing to overwrite an existing site", config_path.display());
    }

    let files: &[(&str, &str)] = &[
        ("tola.toml", DEFAULT_CONFIG),
        ("content/index.md", INDEX_CONTENT),
        ("templates/page.html", PAGE_TEMPLATE),
        ("templates/archive.html", PAGE_TEMPLATE),
        ("assets/css/style.css", STYLE_CSS),
    ];

    if dry_run {
        for (path, _) in files {
            log!("init"; "would write {}", dir.join(path).display());
        }
        return Ok(());
    }

    for (path, content) in files {
        let target = dir.join(path);
        atomic_io::write_text(&target, content).with_context(|| format!("failed to write {}", target.display()))?;
    }
    log!("init"; "scaffolded new site at {}", dir.display());
    Ok(())
}
