//! `InputRecord`, `Provenance`, and `ProvenanceRecord`.

use serde::{Deserialize, Serialize};

use crate::hash::{ContentHash, StableHasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Content,
    Metadata,
    Template,
    Partial,
    Data,
    Config,
    Section,
    Asset,
}

/// One input that contributed to a page's render. `logical_path` is a
/// site-relative POSIX path. Instances are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    pub input_type: InputType,
    pub logical_path: String,
    pub hash: ContentHash,
}

impl InputRecord {
    pub fn new(input_type: InputType, logical_path: impl Into<String>, hash: ContentHash) -> Self {
        Self {
            input_type,
            logical_path: logical_path.into(),
            hash,
        }
    }
}

/// An ordered, de-duplicated list of `InputRecord`s plus a `combined_hash`
/// derived deterministically from the sorted list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    pub inputs: Vec<InputRecord>,
    pub combined_hash: ContentHash,
}

impl Provenance {
    pub fn from_inputs(mut inputs: Vec<InputRecord>) -> Self {
        inputs.sort_by(|a, b| (a.input_type as u8, &a.logical_path).cmp(&(b.input_type as u8, &b.logical_path)));
        inputs.dedup_by(|a, b| a.input_type == b.input_type && a.logical_path == b.logical_path);
        let combined_hash = Self::recompute_combined_hash(&inputs);
        Self { inputs, combined_hash }
    }

    /// Recompute `combined_hash` from scratch; used both to build a fresh
    /// `Provenance` and, as a consistency check against hash drift.
    pub fn recompute_combined_hash(inputs: &[InputRecord]) -> ContentHash {
        let mut hasher = StableHasher::new();
        for input in inputs {
            hasher = hasher
                .update_u64(input.input_type as u64)
                .update_str(&input.logical_path)
                .update(input.hash.as_bytes());
        }
        hasher.finish()
    }

    pub fn is_consistent(&self) -> bool {
        self.combined_hash == Self::recompute_combined_hash(&self.inputs)
    }
}

impl PartialEq for Provenance {
    fn eq(&self, other: &Self) -> bool {
        self.combined_hash == other.combined_hash
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub page_id: String,
    pub provenance: Provenance,
    pub output_hash: ContentHash,
    pub created_at: String,
    pub build_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(path: &str) -> InputRecord {
        InputRecord::new(InputType::Content, path, crate::hash::hash_str(path))
    }

    #[test]
    fn test_combined_hash_order_independent_after_sort() {
        let p1 = Provenance::from_inputs(vec![rec("a"), rec("b")]);
        let p2 = Provenance::from_inputs(vec![rec("b"), rec("a")]);
        assert_eq!(p1.combined_hash, p2.combined_hash);
    }

    #[test]
    fn test_dedup() {
        let p = Provenance::from_inputs(vec![rec("a"), rec("a")]);
        assert_eq!(p.inputs.len(), 1);
    }

    #[test]
    fn test_consistency_check() {
        let p = Provenance::from_inputs(vec![rec("a")]);
        assert!(p.is_consistent());

        let mut tampered = p.clone();
        tampered.inputs.push(rec("b"));
        assert!(!tampered.is_consistent());
    }
}
