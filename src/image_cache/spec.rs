//! The image transform spec-string grammar.
//!
//! Space-separated tokens, any order: `<W>x<H>` (either side optional),
//! a format keyword, `q<1..100>`, and an anchor keyword. Unknown tokens are
//! dropped (ignored, not an error).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Webp,
    Avif,
    Jpeg,
    Png,
    Gif,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Webp => "webp",
            Format::Avif => "avif",
            Format::Jpeg => "jpg",
            Format::Png => "png",
            Format::Gif => "gif",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    Smart,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<Format>,
    pub quality: u8,
    pub anchor: Anchor,
    pub filters: Vec<String>,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            format: None,
            quality: 85,
            anchor: Anchor::Center,
            filters: Vec::new(),
        }
    }
}

pub fn parse(spec: &str) -> ImageSpec {
    let mut out = ImageSpec::default();
    for token in spec.split_whitespace() {
        if let Some(dims) = parse_dims(token) {
            out.width = dims.0;
            out.height = dims.1;
            continue;
        }
        if let Some(fmt) = parse_format(token) {
            out.format = Some(fmt);
            continue;
        }
        if let Some(q) = token.strip_prefix('q') {
            if let Ok(v) = q.parse::<u32>() {
                out.quality = if (1..=100).contains(&v) { v as u8 } else { 85 };
            }
            continue;
        }
        if let Some(anchor) = parse_anchor(token) {
            out.anchor = anchor;
            continue;
        }
        if token.starts_with("grayscale") || token.starts_with("blur") {
            out.filters.push(token.to_string());
            continue;
        }
        // unknown token: warned-but-ignored
    }
    out
}

fn parse_dims(token: &str) -> Option<(Option<u32>, Option<u32>)> {
    if !token.contains('x') {
        return None;
    }
    let (w, h) = token.split_once('x')?;
    let width = if w.is_empty() { None } else { w.parse().ok() };
    let height = if h.is_empty() { None } else { h.parse().ok() };
    if width.is_none() && height.is_none() {
        return None;
    }
    Some((width, height))
}

fn parse_format(token: &str) -> Option<Format> {
    Some(match token {
        "webp" => Format::Webp,
        "avif" => Format::Avif,
        "jpeg" | "jpg" => Format::Jpeg,
        "png" => Format::Png,
        "gif" => Format::Gif,
        _ => return None,
    })
}

fn parse_anchor(token: &str) -> Option<Anchor> {
    Some(match token {
        "center" => Anchor::Center,
        "smart" => Anchor::Smart,
        "top" => Anchor::Top,
        "bottom" => Anchor::Bottom,
        "left" => Anchor::Left,
        "right" => Anchor::Right,
        "topleft" => Anchor::TopLeft,
        "topright" => Anchor::TopRight,
        "bottomleft" => Anchor::BottomLeft,
        "bottomright" => Anchor::BottomRight,
        _ => return None,
    })
}
