//! URL slug generation from filenames and titles.

/// Turn a filename stem or title into a URL-safe slug: lowercase ASCII,
/// runs of non-alphanumeric characters collapsed to a single `-`, and
/// leading/trailing `-` trimmed.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_dash = true; // suppress leading dash
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Slugify each path segment independently, preserving `/` separators.
pub fn slugify_path(path: &str) -> String {
    path.split('/')
        .map(slugify)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Already-Slug  "), "already-slug");
        assert_eq!(slugify("C++ & Rust!"), "c-rust");
    }

    #[test]
    fn test_slugify_path() {
        assert_eq!(slugify_path("Blog/My Post"), "blog/my-post");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
    }
}
