//! Stable content-addressed hashing.
//!
//! Provides cross-process deterministic hashing using blake3. This module
//! must be used instead of `std::collections::hash_map::DefaultHasher`,
//! which reseeds on every process start and therefore cannot be compared
//! across builds or persisted to disk.
//!
//! `ContentHash` is the addressable unit the rest of the crate passes
//! around: [`crate::provenance`] keys records by it, [`crate::manifest`]
//! stores it per asset, and [`crate::incremental`] compares it build over
//! build.

use std::io::{self, Read};
use std::path::Path;

use crate::core::Value;

/// A stable content digest. Equality is the only operation that matters;
/// `Display`/`to_hex` expose a 16-hex-character prefix, which is the form
/// persisted in provenance records and cache files.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub const EMPTY: ContentHash = ContentHash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full 64-hex-character representation.
    pub fn to_hex_full(&self) -> String {
        hex::encode(self.0)
    }

    /// The 16-hex-character prefix used in on-disk records.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// An 8-hex-character fingerprint, used for fingerprinted asset
    /// filenames.
    pub fn to_fingerprint(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let mut full = [0u8; 32];
        let n = bytes.len().min(32);
        full[..n].copy_from_slice(&bytes[..n]);
        Some(Self(full))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex_full())
    }
}

impl<'de> serde::Deserialize<'de> for ContentHash {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        ContentHash::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom("invalid content hash hex"))
    }
}

// =============================================================================
// StableHasher - Builder Pattern
// =============================================================================

/// A deterministic hasher builder wrapping blake3.
pub struct StableHasher {
    inner: blake3::Hasher,
}

impl StableHasher {
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    #[inline]
    pub fn update(mut self, data: &[u8]) -> Self {
        self.inner.update(data);
        self
    }

    #[inline]
    pub fn update_str(self, s: &str) -> Self {
        self.update(s.as_bytes())
    }

    #[inline]
    pub fn update_u64(self, v: u64) -> Self {
        self.update(&v.to_le_bytes())
    }

    #[inline]
    pub fn finish(self) -> ContentHash {
        ContentHash(*self.inner.finalize().as_bytes())
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Convenience functions
// =============================================================================

/// Hash a byte slice.
#[inline]
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    StableHasher::new().update(data).finish()
}

/// Hash a string.
#[inline]
pub fn hash_str(s: &str) -> ContentHash {
    hash_bytes(s.as_bytes())
}

/// Hash a file's contents, streaming so large files don't need to be
/// fully buffered.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    let file = std::fs::File::open(path)?;
    hash_reader(file)
}

/// Hash from a reader (streaming, for large files).
pub fn hash_reader(mut reader: impl Read) -> io::Result<ContentHash> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(ContentHash(*hasher.finalize().as_bytes()))
}

/// Hash an arbitrary `Value` tree after canonicalizing it: keys of every
/// map are sorted, and scalars are serialized in a fixed, type-tagged
/// form so that e.g. the integer `1` and the string `"1"` never collide.
///
/// Canonicalization makes the hash independent of source key order, which
/// is required so that two semantically-identical frontmatter blocks (or
/// config sections) with differently-ordered keys hash identically.
pub fn hash_mapping(value: &Value) -> ContentHash {
    let mut buf = Vec::new();
    canonicalize_into(value, &mut buf);
    hash_bytes(&buf)
}

fn canonicalize_into(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::Null => buf.push(0),
        Value::Bool(b) => {
            buf.push(1);
            buf.push(*b as u8);
        }
        Value::Int(i) => {
            buf.push(2);
            buf.extend_from_slice(&i.to_le_bytes());
        }
        Value::Float(f) => {
            buf.push(3);
            buf.extend_from_slice(&f.to_bits().to_le_bytes());
        }
        Value::String(s) => {
            buf.push(4);
            buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
            buf.extend_from_slice(s.as_bytes());
        }
        Value::List(items) => {
            buf.push(5);
            buf.extend_from_slice(&(items.len() as u64).to_le_bytes());
            for item in items {
                canonicalize_into(item, buf);
            }
        }
        Value::Map(map) => {
            buf.push(6);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            buf.extend_from_slice(&(keys.len() as u64).to_le_bytes());
            for key in keys {
                buf.extend_from_slice(&(key.len() as u64).to_le_bytes());
                buf.extend_from_slice(key.as_bytes());
                canonicalize_into(&map[key], buf);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_deterministic() {
        let h1 = hash_str("hello world");
        let h2 = hash_str("hello world");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_inputs() {
        assert_ne!(hash_str("hello"), hash_str("world"));
    }

    #[test]
    fn test_builder_order_matters() {
        let h1 = StableHasher::new().update_str("a").update_str("b").finish();
        let h2 = StableHasher::new().update_str("b").update_str("a").finish();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hex_round_trip() {
        let h = hash_str("round trip me");
        let hex = h.to_hex_full();
        assert_eq!(ContentHash::from_hex(&hex).unwrap(), h);
    }

    #[test]
    fn test_fingerprint_length() {
        let h = hash_str("fingerprint me");
        assert_eq!(h.to_fingerprint().len(), 8);
    }

    #[test]
    fn test_mapping_key_order_independent() {
        let mut m1 = crate::core::Map::new();
        m1.insert("a".into(), Value::Int(1));
        m1.insert("b".into(), Value::String("x".into()));
        let mut m2 = crate::core::Map::new();
        m2.insert("b".into(), Value::String("x".into()));
        m2.insert("a".into(), Value::Int(1));

        assert_eq!(hash_mapping(&Value::Map(m1)), hash_mapping(&Value::Map(m2)));
    }

    #[test]
    fn test_mapping_distinguishes_int_and_string() {
        let mut m1 = crate::core::Map::new();
        m1.insert("k".into(), Value::Int(1));
        let mut m2 = crate::core::Map::new();
        m2.insert("k".into(), Value::String("1".into()));

        assert_ne!(hash_mapping(&Value::Map(m1)), hash_mapping(&Value::Map(m2)));
    }

    #[test]
    fn test_nested_mapping_order_independent() {
        let mut inner1 = crate::core::Map::new();
        inner1.insert("x".into(), Value::Int(1));
        inner1.insert("y".into(), Value::Int(2));
        let mut outer1 = crate::core::Map::new();
        outer1.insert("inner".into(), Value::Map(inner1));

        let mut inner2 = crate::core::Map::new();
        inner2.insert("y".into(), Value::Int(2));
        inner2.insert("x".into(), Value::Int(1));
        let mut outer2 = crate::core::Map::new();
        outer2.insert("inner".into(), Value::Map(inner2));

        assert_eq!(hash_mapping(&Value::Map(outer1)), hash_mapping(&Value::Map(outer2)));
    }
}
