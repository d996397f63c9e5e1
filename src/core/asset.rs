//! Asset data model.

use std::path::PathBuf;

use super::UrlPath;

/// Derived from file extension: drives classification and processing
/// choices in [`crate::asset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Css,
    JavaScript,
    Image,
    Font,
    Other,
}

impl AssetKind {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "css" => AssetKind::Css,
            "js" | "mjs" => AssetKind::JavaScript,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" => AssetKind::Image,
            "woff" | "woff2" | "ttf" | "otf" | "eot" => AssetKind::Font,
            _ => AssetKind::Other,
        }
    }
}

/// One input asset discovered under `assets/`. `is_css_entry` is true
/// only for files literally named `style.css`; everything else that
/// is CSS is a module, pulled in only via `@import`.
#[derive(Debug, Clone)]
pub struct Asset {
    pub source_path: PathBuf,
    pub logical_path: String,
    pub kind: AssetKind,
    pub is_css_entry: bool,
}

impl Asset {
    pub fn discover(source_path: PathBuf, logical_path: String) -> Self {
        let ext = source_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let kind = AssetKind::from_extension(ext);
        let is_css_entry = kind == AssetKind::Css
            && source_path.file_name().and_then(|n| n.to_str()) == Some("style.css");
        Self {
            source_path,
            logical_path,
            kind,
            is_css_entry,
        }
    }

    pub fn url(&self) -> UrlPath {
        UrlPath::from_asset(&format!("/assets/{}", self.logical_path))
    }
}
