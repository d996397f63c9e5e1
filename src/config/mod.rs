//! Typed configuration surface.
//!
//! Every recognized config key has a typed field here; there is no dynamic
//! "config as a map" path. Unknown keys are collected (via
//! `serde_ignored`) and reported as a warning rather than a hard error, so
//! a theme author's experimental keys don't break someone else's build.

mod error;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_language() -> String {
    "en".to_string()
}

fn default_pagination_per_page() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteSection {
    pub title: String,
    pub baseurl: String,
    pub description: String,
    pub author: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            title: String::new(),
            baseurl: String::new(),
            description: String::new(),
            author: String::new(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildSection {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    #[serde(default = "default_true")]
    pub parallel: bool,
    pub strict_mode: bool,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    pub max_workers: Option<usize>,
    pub fonts: FontsSection,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            content_dir: default_content_dir(),
            parallel: true,
            strict_mode: false,
            cache_enabled: true,
            max_workers: None,
            fonts: FontsSection::default(),
        }
    }
}

/// Web-font config: each entry becomes one
/// `@font-face` rule, generated into the asset pipeline's input set
/// rather than copied as a static asset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FontsSection {
    pub faces: Vec<FontFace>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FontFace {
    pub family: String,
    pub file: String,
    #[serde(default = "default_font_weight")]
    pub weight: String,
    #[serde(default = "default_font_style")]
    pub style: String,
}

fn default_font_weight() -> String {
    "normal".to_string()
}

fn default_font_style() -> String {
    "normal".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AssetsSection {
    pub minify: bool,
    pub optimize: bool,
    #[serde(default = "default_true")]
    pub fingerprint: bool,
    pub pipeline: bool,
    pub bundle_js: bool,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            minify: true,
            optimize: false,
            fingerprint: true,
            pipeline: false,
            bundle_js: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CssSection {
    pub optimize: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[serde(untagged)]
pub enum ThemeSection {
    Name(String),
    Detailed { name: String },
}

impl Default for ThemeSectionResolved {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
        }
    }
}

/// Normalized form of [`ThemeSection`]'s two allowed shapes (`theme =
/// "name"` or `[theme] name = "..."`) into one shape: `theme` may be a
/// bare string or a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSectionResolved {
    pub name: String,
}

impl From<ThemeSection> for ThemeSectionResolved {
    fn from(value: ThemeSection) -> Self {
        match value {
            ThemeSection::Name(name) => Self { name },
            ThemeSection::Detailed { name } => Self { name },
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VersioningSection {
    pub enabled: bool,
    pub default_redirect: bool,
    pub emit_versions_json: bool,
    pub deploy_prefix: Option<String>,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HealthCheckSection {
    pub enabled: bool,
    pub strict_mode: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PaginationSection {
    #[serde(default = "default_pagination_per_page")]
    pub per_page: usize,
    pub threshold: usize,
}

impl Default for PaginationSection {
    fn default() -> Self {
        Self {
            per_page: default_pagination_per_page(),
            threshold: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum I18nStrategy {
    #[default]
    None,
    Prefix,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct I18nSection {
    pub strategy: I18nStrategy,
    pub default_language: Option<String>,
    pub languages: Vec<String>,
    pub default_in_subdir: bool,
}

/// The fully-typed, deserialized site configuration. Construction always
/// goes through [`SiteConfig::load`], which resolves relative paths to
/// absolute and surfaces unknown-key warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    pub site: SiteSection,
    pub build: BuildSection,
    pub assets: AssetsSection,
    pub css: CssSection,
    #[serde(skip_serializing)]
    pub theme: ThemeSectionResolved,
    pub versioning: VersioningSection,
    pub health_check: HealthCheckSection,
    pub pagination: PaginationSection,
    pub i18n: I18nSection,
}

impl SiteConfig {
    /// Parse from TOML source, collecting any unrecognized top-level keys
    /// into `diagnostics` as warnings (not errors) rather than rejecting
    /// the config outright.
    pub fn from_str(source: &str) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let mut diagnostics = ConfigDiagnostics::default();

        let mut ignored = Vec::new();
        let de = toml::de::Deserializer::new(source);
        let mut raw: RawConfig = serde_ignored::deserialize(de, |path| ignored.push(path.to_string()))?;
        for path in ignored {
            diagnostics.warn(format!("unknown config key: {path}"));
        }

        let theme = raw.theme.take().map(ThemeSectionResolved::from).unwrap_or_default();

        let config = SiteConfig {
            site: raw.site,
            build: raw.build,
            assets: raw.assets,
            css: raw.css,
            theme,
            versioning: raw.versioning,
            health_check: raw.health_check,
            pagination: raw.pagination,
            i18n: raw.i18n,
        };
        config.validate(&mut diagnostics)?;
        Ok((config, diagnostics))
    }

    pub fn load(path: &Path) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_str(&source)
    }

    fn validate(&self, diagnostics: &mut ConfigDiagnostics) -> Result<(), ConfigError> {
        if self.pagination.per_page == 0 {
            diagnostics.error("pagination.per-page".into(), "must be greater than zero".into());
        }
        if diagnostics.has_errors() {
            return Err(ConfigError::Diagnostics(diagnostics.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct RawConfig {
    site: SiteSection,
    build: BuildSection,
    assets: AssetsSection,
    css: CssSection,
    theme: Option<ThemeSection>,
    versioning: VersioningSection,
    health_check: HealthCheckSection,
    pagination: PaginationSection,
    i18n: I18nSection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let (config, _) = SiteConfig::from_str(
            r#"
            [site]
            title = "T"
            [build]
            output_dir = "public"
            "#,
        )
        .unwrap();
        assert_eq!(config.site.title, "T");
        assert_eq!(config.build.output_dir, PathBuf::from("public"));
        assert_eq!(config.site.language, "en");
    }

    #[test]
    fn test_theme_as_bare_string() {
        let (config, _) = SiteConfig::from_str(r#"theme = "mytheme""#).unwrap();
        assert_eq!(config.theme.name, "mytheme");
    }

    #[test]
    fn test_theme_as_table() {
        let (config, _) = SiteConfig::from_str(
            r#"
            [theme]
            name = "mytheme"
            "#,
        )
        .unwrap();
        assert_eq!(config.theme.name, "mytheme");
    }

    #[test]
    fn test_unknown_key_is_warning_not_error() {
        let (_config, diagnostics) = SiteConfig::from_str(
            r#"
            [site]
            title = "T"
            typo_field = "oops"
            "#,
        )
        .unwrap();
        assert!(!diagnostics.warnings.is_empty());
    }

    #[test]
    fn test_invalid_pagination_is_error() {
        let err = SiteConfig::from_str(
            r#"
            [pagination]
            per-page = 0
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_defaults_applied() {
        let (config, _) = SiteConfig::from_str("").unwrap();
        assert!(config.build.parallel);
        assert!(config.build.cache_enabled);
        assert_eq!(config.pagination.per_page, 10);
    }
}
