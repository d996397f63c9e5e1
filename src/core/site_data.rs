//! `SiteData`: the immutable, thread-shareable half of a build.

use std::path::{Path, PathBuf};

use crate::config::SiteConfig;

/// Built once per invocation from the loaded config. All paths are
/// absolute. Contains nothing that changes during a build, so it is
/// shared across worker threads by plain reference — no locking needed.
#[derive(Debug, Clone)]
pub struct SiteData {
    pub root_path: PathBuf,
    pub output_dir: PathBuf,
    pub content_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub theme_name: String,
    pub config: SiteConfig,
}

impl SiteData {
    pub fn new(root: &Path, config: SiteConfig) -> Self {
        let root_path = root.to_path_buf();
        Self {
            output_dir: root_path.join(&config.build.output_dir),
            content_dir: root_path.join(&config.build.content_dir),
            assets_dir: root_path.join("assets"),
            data_dir: root_path.join("data"),
            cache_dir: root_path.join(".tola"),
            templates_dir: root_path.join("templates"),
            theme_name: config.theme.name.clone(),
            root_path,
            config,
        }
    }

    pub fn theme_dir(&self) -> PathBuf {
        self.root_path.join("themes").join(&self.theme_name)
    }
}
