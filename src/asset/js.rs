//! JS bundling: fixed declared module order plus an exclusion set,
//! concatenated into `js/bundle.js`. Minification goes through `oxc`.

use std::path::Path;

pub struct JsBundleConfig {
    pub modules: Vec<String>,
    pub excluded: Vec<String>,
}

pub fn bundle(assets_dir: &Path, config: &JsBundleConfig) -> String {
    let mut out = String::new();
    for module in &config.modules {
        if config.excluded.iter().any(|e| e == module) {
            continue;
        }
        if let Ok(source) = std::fs::read_to_string(assets_dir.join(module)) {
            out.push_str(&source);
            out.push('\n');
        }
    }
    out
}

/// Minify via oxc. Falls back to the unminified source on any parse
/// failure.
pub fn minify(source: &str) -> Result<String, String> {
    use oxc::allocator::Allocator;
    use oxc::codegen::Codegen;
    use oxc::minifier::{Minifier, MinifierOptions};
    use oxc::parser::Parser;
    use oxc::span::SourceType;

    let allocator = Allocator::default();
    let source_type = SourceType::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if !parsed.errors.is_empty() {
        return Err(format!("{} parse error(s)", parsed.errors.len()));
    }
    let mut program = parsed.program;
    Minifier::new(MinifierOptions::default()).minify(&allocator, &mut program);
    let output = Codegen::new().build(&program);
    Ok(output.code)
}
