//! Root-redirect page, emitted only when
//! versioning and `default_redirect` are both enabled.

use std::path::Path;

use crate::atomic_io;
use crate::config::VersioningSection;

pub fn write_root_redirect(
    versioning: &VersioningSection,
    default_version_prefix: &str,
    output_dir: &Path,
) -> std::io::Result<()> {
    if !versioning.enabled || !versioning.default_redirect {
        return Ok(());
    }
    let html = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">\
         <meta http-equiv=\"refresh\" content=\"0; url={default_version_prefix}\">\
         <link rel=\"canonical\" href=\"{default_version_prefix}\"></head>\
         <body>Redirecting to <a href=\"{default_version_prefix}\">{default_version_prefix}</a>.</body></html>\n"
    );
    atomic_io::write_text(&output_dir.join("index.html"), &html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_skipped_when_redirect_disabled() {
        let dir = TempDir::new().unwrap();
        let versioning = VersioningSection { enabled: true, ..Default::default() };
        write_root_redirect(&versioning, "/1.0/", dir.path()).unwrap();
        assert!(!dir.path().join("index.html").exists());
    }

    #[test]
    fn test_written_when_enabled() {
        let dir = TempDir::new().unwrap();
        let versioning = VersioningSection {
            enabled: true,
            default_redirect: true,
            ..Default::default()
        };
        write_root_redirect(&versioning, "/1.0/", dir.path()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(content.contains("url=/1.0/"));
    }
}
