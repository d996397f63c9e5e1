//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand};

/// Tola static site generator CLI.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Emit per-phase timings and per-page/per-asset decisions
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// Site root directory (default: current directory)
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Config file path, relative to the site root
    #[arg(short = 'C', long, global = true, default_value = "tola.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scaffold a new site directory
    #[command(visible_alias = "i")]
    Init {
        /// Site directory name/path (relative to current directory)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        name: Option<PathBuf>,
    },

    /// Build the site
    #[command(visible_alias = "b")]
    Build {
        /// Bypass the incremental decision table and rebuild everything
        #[arg(long)]
        full: bool,
    },

    /// Serve the built site over HTTP (no file watching; rebuild with `build`)
    #[command(visible_alias = "s")]
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },

    /// Check content and config for structural problems without building
    #[command(visible_alias = "v")]
    Validate,
}
