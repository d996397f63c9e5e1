//! Tola - a static site generator with content-addressed incremental
//! builds.

mod asset;
mod atomic_io;
mod cli;
mod config;
mod content;
mod core;
mod error;
mod generator;
mod hash;
mod image_cache;
mod incremental;
mod logger;
mod manifest;
mod orchestrator;
mod provenance;
mod render;
mod template;
mod utils;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};

use cli::{Cli, Commands};
use config::SiteConfig;
use core::SiteData;
use crate::utils::plural_count;

fn main() -> Result<()> {
    core::shutdown::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    logger::set_verbose(cli.verbose);

    let root = cli.root.clone().unwrap_or(std::env::current_dir()?);

    match &cli.command {
        Commands::Init { name } => {
            let dir = name.clone().map(|n| root.join(n)).unwrap_or(root);
            cli::init::new_site(&dir, false)
        }
        Commands::Build { full } => {
            let site = load_site(&root, &cli.config)?;
            let report = orchestrator::run_build(&site, *full)?;
            print_summary(&report);
            if report.pages_failed > 0 {
                anyhow::bail!("{} failed to render", plural_count(report.pages_failed, "page"));
            }
            Ok(())
        }
        Commands::Serve { port } => {
            let site = load_site(&root, &cli.config)?;
            cli::serve::serve_once(&site, *port)
        }
        Commands::Validate => {
            let site = load_site(&root, &cli.config)?;
            cli::validate::validate_site(&site)
        }
    }
}

/// Load config from `<root>/<config_rel>` and build the immutable
/// [`SiteData`] every phase reads from.
fn load_site(root: &std::path::Path, config_rel: &PathBuf) -> Result<SiteData> {
    let config_path = root.join(config_rel);
    let (config, diagnostics) = SiteConfig::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    for warning in &diagnostics.warnings {
        log!("config"; "warning: {warning}");
    }
    Ok(SiteData::new(root, config))
}

fn print_summary(report: &orchestrator::BuildReport) {
    log!("build"; "{} rendered, {} cached, {}, {} processed, {}ms",
        plural_count(report.pages_rendered, "page"),
        plural_count(report.pages_cache_hit, "page"),
        plural_count(report.pages_failed, "failure"),
        plural_count(report.assets_processed, "asset"),
        report.elapsed_ms);
    for warning in &report.warnings {
        log!("build"; "warning: {warning}");
    }
}
