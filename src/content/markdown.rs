//! Markdown body rendering, via `pulldown-cmark`.

use pulldown_cmark::{html, Options, Parser};

pub fn render_to_html(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let parser = Parser::new_ext(body, options);
    let mut html_output = String::with_capacity(body.len() * 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// First N characters of the rendered body's plain text, for pages with no
/// explicit `summary` frontmatter field. Strips tags with a simple scan
/// rather than pulling in an HTML parser just for this.
pub fn derive_summary(rendered_html: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(max_chars);
    let mut in_tag = false;
    for c in rendered_html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => {
                out.push(c);
                if out.chars().count() >= max_chars {
                    break;
                }
            }
            _ => {}
        }
    }
    out.trim().to_string()
}
