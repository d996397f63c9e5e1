//! Data-file loading (YAML/JSON/TOML), reported to provenance as `Data`
//! inputs. No YAML crate is part of this crate's dependency stack
//! (see DESIGN.md), so `.yaml`/`.yml` files are not supported here; JSON
//! and TOML are.

use std::path::Path;

use crate::core::Value;
use crate::hash::hash_str;
use crate::provenance::ProvenanceCollector;

pub fn load(data_dir: &Path, logical_path: &str, collector: &ProvenanceCollector) -> Option<Value> {
    let candidates = [
        data_dir.join(format!("{logical_path}.json")),
        data_dir.join(format!("{logical_path}.toml")),
    ];
    for path in candidates {
        if let Ok(source) = std::fs::read_to_string(&path) {
            collector.record_data(logical_path, hash_str(&source));
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            return match ext {
                "json" => serde_json::from_str::<serde_json::Value>(&source).ok().map(Value::from),
                "toml" => toml::from_str::<toml::Value>(&source).ok().map(Value::from),
                _ => None,
            };
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::ProvenanceCollector;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_records_provenance() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("authors.json"), r#"{"a": 1}"#).unwrap();
        let collector = ProvenanceCollector::new();

        let value = load(dir.path(), "authors", &collector).unwrap();
        assert_eq!(value.get("a").unwrap().as_int_or(0), 1);
        assert_eq!(collector.finish().inputs.len(), 1);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let collector = ProvenanceCollector::new();
        assert!(load(dir.path(), "missing", &collector).is_none());
    }
}
