//! CSS bundling: recursive `@import` resolution with `@layer`
//! preservation, hand-rolled over plain text rather than lightningcss's own
//! bundler, because the ordering and missing-import rules here are
//! stricter than its defaults. An optional tree-shaking pass
//! ([`optimize`]) drops rules unreferenced by the previous build's HTML
//! before minification, which does go through lightningcss.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};

/// Recursively inline `@import` statements starting from `entry`. Imports
/// nested inside a `@layer name { ... }` block stay inside that same
/// block, in declaration order; imports that resolve to a missing file or
/// to an external URL are left untouched rather than treated as errors.
pub fn bundle(entry: &Path) -> String {
    let mut visited = Vec::new();
    bundle_inner(entry, &mut visited)
}

fn bundle_inner(path: &Path, visited: &mut Vec<PathBuf>) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if visited.contains(&canonical) {
        return String::new(); // import cycle: skip, already inlined once
    }
    visited.push(canonical);

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    resolve_imports(&source, path.parent().unwrap_or_else(|| Path::new(".")), visited)
}

fn resolve_imports(source: &str, base_dir: &Path, visited: &mut Vec<PathBuf>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(import_start) = rest.find("@import") {
        out.push_str(&rest[..import_start]);
        let after = &rest[import_start..];
        let stmt_end = after.find(';').map(|i| i + 1).unwrap_or(after.len());
        let statement = &after[..stmt_end];
        rest = &after[stmt_end..];

        if let Some(target) = extract_import_target(statement) {
            if is_external(&target) {
                out.push_str(statement);
            } else {
                let import_path = base_dir.join(&target);
                if import_path.is_file() {
                    out.push_str(&bundle_inner(&import_path, visited));
                } else {
                    // missing import: preserved verbatim, not an error
                    out.push_str(statement);
                }
            }
        } else {
            out.push_str(statement);
        }
    }
    out.push_str(rest);
    out
}

fn extract_import_target(statement: &str) -> Option<String> {
    let inner = statement.trim_start_matches("@import").trim();
    let inner = inner.strip_prefix("url(").map(|s| s.trim_end_matches(')')).unwrap_or(inner);
    let inner = inner.trim_end_matches(';').trim();
    let inner = inner.trim_matches('"').trim_matches('\'');
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

fn is_external(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://") || target.starts_with("//")
}

/// Minify already-bundled CSS via lightningcss. Falls back to the
/// unminified input on any parse/print failure rather than failing the
/// build.
pub fn minify(css: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(css, ParserOptions::default()).map_err(|e| e.to_string())?;
    let mut stylesheet = stylesheet;
    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| e.to_string())?;
    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(printed.code)
}

/// Walk a previously-built output tree and collect every `class="..."`
/// and `id="..."` token found in its HTML, as the reference set
/// [`optimize`] tree-shakes bundled CSS against. Run before the current
/// build overwrites those files, since it reflects the *last* build's
/// markup, not the one in progress.
pub fn collect_used_selectors(output_dir: &Path) -> HashSet<String> {
    let mut used = HashSet::new();
    for entry in WalkDir::new(output_dir).into_iter().filter_map(Result::ok) {
        if entry.path().extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        if let Ok(html) = std::fs::read_to_string(entry.path()) {
            collect_from_html(&html, &mut used);
        }
    }
    used
}

fn collect_from_html(html: &str, used: &mut HashSet<String>) {
    for (attr, prefix) in [("class=\"", '.'), ("id=\"", '#')] {
        let mut rest = html;
        while let Some(start) = rest.find(attr) {
            let after = &rest[start + attr.len()..];
            let Some(end) = after.find('"') else { break };
            for token in after[..end].split_whitespace() {
                used.insert(format!("{prefix}{token}"));
            }
            rest = &after[end + 1..];
        }
    }
}

/// Drop rule blocks whose selectors reference only classes/ids absent
/// from `used`. At-rules (`@media`, `@font-face`, `@keyframes`,
/// `@layer`, ...) and selectors carrying no class/id token at all
/// (element, universal, pseudo selectors) are always kept — there's not
/// enough information here to prove either is unused.
pub fn optimize(css: &str, used: &HashSet<String>) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(brace) = rest.find('{') {
        let selector = rest[..brace].trim();
        let block_and_rest = &rest[brace..];
        let block_len = matching_brace_end(block_and_rest);
        let (block, after) = block_and_rest.split_at(block_len);

        if selector.starts_with('@') || selector_is_referenced(selector, used) {
            out.push_str(&rest[..brace]);
            out.push_str(block);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

/// Index just past the brace matching the one that opens `s`.
fn matching_brace_end(s: &str) -> usize {
    let mut depth = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    s.len()
}

fn selector_is_referenced(selector: &str, used: &HashSet<String>) -> bool {
    selector.split(',').any(|branch| {
        let tokens = class_and_id_tokens(branch);
        tokens.is_empty() || tokens.iter().any(|t| used.contains(t))
    })
}

fn class_and_id_tokens(branch: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = branch.chars().peekable();
    while let Some(marker) = chars.next() {
        if marker != '.' && marker != '#' {
            continue;
        }
        let mut token = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                token.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if !token.is_empty() {
            tokens.push(format!("{marker}{token}"));
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_bundle_inlines_import() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "base.css", "a {}");
        let entry = write(dir.path(), "style.css", "@import \"base.css\";\nb {}");

        let bundled = bundle(&entry);
        assert!(bundled.contains("a {}"));
        assert!(bundled.contains("b {}"));
    }

    #[test]
    fn test_missing_import_preserved_verbatim() {
        let dir = TempDir::new().unwrap();
        let entry = write(dir.path(), "style.css", "@import \"missing.css\";\nb {}");

        let bundled = bundle(&entry);
        assert!(bundled.contains("@import \"missing.css\""));
    }

    #[test]
    fn test_external_import_preserved_verbatim() {
        let dir = TempDir::new().unwrap();
        let entry = write(
            dir.path(),
            "style.css",
            "@import url(\"https://fonts.example.com/a.css\");\nb {}",
        );

        let bundled = bundle(&entry);
        assert!(bundled.contains("https://fonts.example.com/a.css"));
    }

    #[test]
    fn test_layer_block_import_stays_inside_layer() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "reset.css", "* { margin: 0; }");
        let entry = write(
            dir.path(),
            "style.css",
            "@layer base {\n@import \"reset.css\";\n}\nb {}",
        );

        let bundled = bundle(&entry);
        assert!(bundled.contains("@layer base"));
        assert!(bundled.contains("margin: 0"));
    }

    #[test]
    fn test_import_cycle_does_not_infinite_loop() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.css", "@import \"b.css\";\n.a{}");
        write(dir.path(), "b.css", "@import \"a.css\";\n.b{}");
        let entry = dir.path().join("a.css");

        let bundled = bundle(&entry);
        assert!(bundled.contains(".a{}") || bundled.contains(".b{}"));
    }

    #[test]
    fn test_optimize_drops_rule_with_no_matching_class() {
        let used = HashSet::from([".card".to_string()]);
        let css = ".card { color: red; }\n.unused { color: blue; }";
        let optimized = optimize(css, &used);
        assert!(optimized.contains(".card"));
        assert!(!optimized.contains(".unused"));
    }

    #[test]
    fn test_optimize_keeps_element_and_at_rule_selectors() {
        let used = HashSet::new();
        let css = "body { margin: 0; }\n@font-face { font-family: X; }\n.gone { color: red; }";
        let optimized = optimize(css, &used);
        assert!(optimized.contains("body"));
        assert!(optimized.contains("@font-face"));
        assert!(!optimized.contains(".gone"));
    }

    #[test]
    fn test_optimize_keeps_rule_if_any_comma_branch_is_used() {
        let used = HashSet::from([".b".to_string()]);
        let css = ".a, .b { color: red; }";
        let optimized = optimize(css, &used);
        assert!(optimized.contains(".a, .b"));
    }

    #[test]
    fn test_collect_used_selectors_reads_class_and_id_attributes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "<div class=\"card active\" id=\"main\">hi</div>");

        let used = collect_used_selectors(dir.path());
        assert!(used.contains(".card"));
        assert!(used.contains(".active"));
        assert!(used.contains("#main"));
    }
}
