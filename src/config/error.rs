//! Config loading/validation errors and the diagnostics collected along
//! the way.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config validation failed:\n{0}")]
    Diagnostics(ConfigDiagnostics),
}

/// A single validation problem, anchored to the dotted field path that
/// caused it (e.g. `pagination.per-page`).
#[derive(Debug, Clone)]
pub struct ConfigDiagnostic {
    pub field: String,
    pub message: String,
    pub hint: Option<String>,
}

impl std::fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Accumulates errors, warnings, and hints across a single config load so
/// every problem is reported at once instead of failing on the first one.
#[derive(Debug, Clone, Default)]
pub struct ConfigDiagnostics {
    pub errors: Vec<ConfigDiagnostic>,
    pub warnings: Vec<String>,
    pub hints: Vec<String>,
}

impl ConfigDiagnostics {
    pub fn error(&mut self, field: String, message: String) {
        self.errors.push(ConfigDiagnostic {
            field,
            message,
            hint: None,
        });
    }

    pub fn error_with_hint(&mut self, field: String, message: String, hint: String) {
        self.errors.push(ConfigDiagnostic {
            field,
            message,
            hint: Some(hint),
        });
    }

    pub fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub fn hint(&mut self, message: String) {
        self.hints.push(message);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl std::fmt::Display for ConfigDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for e in &self.errors {
            writeln!(f, "  error: {e}")?;
        }
        for w in &self.warnings {
            writeln!(f, "  warning: {w}")?;
        }
        for h in &self.hints {
            writeln!(f, "  hint: {h}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors() {
        let mut d = ConfigDiagnostics::default();
        assert!(!d.has_errors());
        d.error("build.output-dir".into(), "must not be empty".into());
        assert!(d.has_errors());
    }

    #[test]
    fn test_display_includes_all_categories() {
        let mut d = ConfigDiagnostics::default();
        d.error("a".into(), "bad".into());
        d.warn("unused key".into());
        d.hint("try this".into());
        let rendered = d.to_string();
        assert!(rendered.contains("error"));
        assert!(rendered.contains("warning"));
        assert!(rendered.contains("hint"));
    }
}
