//! Frontmatter extraction.
//!
//! Two fence styles are recognized, both parsed as TOML: `+++ ... +++`
//! (explicit TOML fences) and `--- ... ---` (the conventional fence
//! position, parsed as TOML rather than YAML since no YAML crate is part
//! of the dependency stack this crate draws from — see DESIGN.md).

use crate::core::Value;

pub struct ParsedContent {
    pub frontmatter: Value,
    pub body: String,
}

/// Split a raw source file into `(frontmatter, body)`. A file with no
/// recognized fence has empty (`Value::Map` with no entries) frontmatter
/// and the whole source as its body.
pub fn parse(source: &str) -> ParsedContent {
    if let Some(rest) = source.strip_prefix("+++\n").or_else(|| source.strip_prefix("+++\r\n")) {
        return split_on_fence(rest, "+++");
    }
    if let Some(rest) = source.strip_prefix("---\n").or_else(|| source.strip_prefix("---\r\n")) {
        return split_on_fence(rest, "---");
    }
    ParsedContent {
        frontmatter: Value::Map(Default::default()),
        body: source.to_string(),
    }
}

fn split_on_fence(rest: &str, fence: &str) -> ParsedContent {
    let marker = format!("\n{fence}");
    match rest.find(&marker) {
        Some(idx) => {
            let raw_fm = &rest[..idx];
            let after = &rest[idx + marker.len()..];
            let body = after.strip_prefix('\n').unwrap_or(after).trim_start_matches('\r').to_string();
            let frontmatter = toml::from_str::<toml::Value>(raw_fm)
                .map(Value::from)
                .unwrap_or_else(|_| Value::Map(Default::default()));
            ParsedContent { frontmatter, body }
        }
        None => ParsedContent {
            frontmatter: Value::Map(Default::default()),
            body: rest.to_string(),
        },
    }
}

/// Serialize frontmatter back to the `+++`-fenced TOML form. Only used by
/// tooling (content scaffolding, round-trip tests); never by the render
/// path.
pub fn serialize(value: &Value) -> String {
    let json: serde_json::Value = value.into();
    let toml_value: toml::Value = json_to_toml(&json);
    let body = toml::to_string_pretty(&toml_value).unwrap_or_default();
    format!("+++\n{body}+++\n")
}

fn json_to_toml(v: &serde_json::Value) -> toml::Value {
    match v {
        serde_json::Value::Null => toml::Value::String(String::new()),
        serde_json::Value::Bool(b) => toml::Value::Boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                toml::Value::Integer(i)
            } else {
                toml::Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => toml::Value::String(s.clone()),
        serde_json::Value::Array(items) => toml::Value::Array(items.iter().map(json_to_toml).collect()),
        serde_json::Value::Object(map) => {
            let mut table = toml::map::Map::new();
            for (k, v) in map {
                table.insert(k.clone(), json_to_toml(v));
            }
            toml::Value::Table(table)
        }
    }
}
