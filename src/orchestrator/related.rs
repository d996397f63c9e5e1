//! Related-posts precomputation (P8): for each tagged page, the other
//! pages sharing the most tags, O(n·t) as spec.md requires (n pages, t
//! tags per page — the inner loop only compares tag sets, never does a
//! full cross join over content).

use std::collections::HashMap;

use crate::core::Page;

const MAX_RELATED: usize = 5;

/// Returns `source_path -> ordered related source_paths`, most shared
/// tags first, ties broken by the candidate's position in `pages`.
pub fn compute(pages: &[&Page]) -> HashMap<String, Vec<String>> {
    let mut result = HashMap::new();
    for (i, page) in pages.iter().enumerate() {
        if page.meta.tags.is_empty() || page.is_draft() {
            continue;
        }
        let mut scored: Vec<(usize, usize)> = Vec::new();
        for (j, other) in pages.iter().enumerate() {
            if i == j || other.is_draft() {
                continue;
            }
            let shared = page.meta.tags.iter().filter(|t| other.meta.tags.contains(t)).count();
            if shared > 0 {
                scored.push((j, shared));
            }
        }
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let related: Vec<String> = scored.into_iter().take(MAX_RELATED).map(|(j, _)| pages[j].source_path.clone()).collect();
        if !related.is_empty() {
            result.insert(page.source_path.clone(), related);
        }
    }
    result
}
