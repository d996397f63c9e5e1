//! Error kinds shared across the non-config parts of the build.
//!
//! `ConfigError` lives in [`crate::config::error`] since it is only ever
//! produced during config load, before any of these other phases run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read content path {0}: {1}")]
    Unreadable(PathBuf, #[source] std::io::Error),

    #[error("unparseable frontmatter in {0}: {1}")]
    Frontmatter(PathBuf, String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template evaluation failed for {page}: {source}")]
    Evaluation {
        page: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("invalid include in {0}: {1}")]
    InvalidInclude(String, String),
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("image processing failed for {0}: {1}")]
    ImageProcessing(PathBuf, String),

    #[error("minification failed for {0}, falling back to unminified: {1}")]
    MinifyFallback(PathBuf, String),

    #[error("fingerprint collision on {0}, last write wins")]
    FingerprintCollision(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("corrupt cache file {0}, treating as absent")]
    Corrupt(PathBuf),

    #[error("cache write failed: {0}")]
    WriteFailed(#[source] std::io::Error),
}

/// Cancellation and process-exit signals. Never caught and swallowed by a
/// worker's per-item error handling — propagated immediately up through
/// the orchestrator.
#[derive(Debug, Error)]
pub enum CriticalInterrupt {
    #[error("build cancelled")]
    Cancelled,
}
