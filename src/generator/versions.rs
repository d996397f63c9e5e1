//! `versions.json` generation: a Mike-compatible array of version
//! descriptors, emitted only when `versioning.enabled` and
//! `versioning.emit_versions_json` are both set.

use serde::Serialize;
use std::path::Path;

use crate::atomic_io;
use crate::config::VersioningSection;

#[derive(Debug, Clone, Serialize)]
pub struct VersionDescriptor {
    pub version: String,
    pub title: String,
    pub aliases: Vec<String>,
    pub url_prefix: String,
}

pub fn write_versions_json(
    versioning: &VersioningSection,
    descriptors: &[VersionDescriptor],
    output_dir: &Path,
) -> std::io::Result<()> {
    if !versioning.enabled || !versioning.emit_versions_json {
        return Ok(());
    }
    let json = serde_json::to_string_pretty(descriptors)?;
    atomic_io::write_text(&output_dir.join("versions.json"), &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_skipped_when_disabled() {
        let dir = TempDir::new().unwrap();
        let versioning = VersioningSection::default();
        write_versions_json(&versioning, &[], dir.path()).unwrap();
        assert!(!dir.path().join("versions.json").exists());
    }

    #[test]
    fn test_written_when_enabled() {
        let dir = TempDir::new().unwrap();
        let versioning = VersioningSection {
            enabled: true,
            emit_versions_json: true,
            ..Default::default()
        };
        let descriptors = vec![VersionDescriptor {
            version: "1.0".into(),
            title: "v1.0".into(),
            aliases: vec!["latest".into()],
            url_prefix: "/1.0/".into(),
        }];
        write_versions_json(&versioning, &descriptors, dir.path()).unwrap();
        let content = std::fs::read_to_string(dir.path().join("versions.json")).unwrap();
        assert!(content.contains("\"latest\""));
    }
}
