//! Web-font `@font-face` CSS generation: turns configured font faces into
//! a generated stylesheet fed into the asset pipeline's input set.

use crate::config::FontsSection;

/// Render one `@font-face` rule per configured face. Returns `None` when
/// no faces are configured, so callers can skip emitting an empty file.
pub fn render_font_css(fonts: &FontsSection) -> Option<String> {
    if fonts.faces.is_empty() {
        return None;
    }
    let mut css = String::new();
    for face in &fonts.faces {
        css.push_str(&format!(
            "@font-face {{\n  font-family: \"{}\";\n  src: url(\"{}\");\n  font-weight: {};\n  font-style: {};\n}}\n",
            face.family, face.file, face.weight, face.style
        ));
    }
    Some(css)
}
