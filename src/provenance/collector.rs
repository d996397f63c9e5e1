//! Explicit dependency-capture handle, passed by reference through the
//! render call chain instead of relying on a context-local "currently
//! tracking" handle.
//!
//! A thread-local or coroutine-context tracker would let any deeply
//! nested template resource access report itself implicitly, but that
//! hides control flow. Here, every template-loader and data-loader
//! wrapper takes a `&ProvenanceCollector` and calls `record()` directly —
//! no hidden state, and two renders never share a collector even if they
//! run on the same thread.

use parking_lot::Mutex;

use super::record::{InputRecord, InputType, Provenance};
use crate::hash::ContentHash;

#[derive(Default, Debug)]
pub struct ProvenanceCollector {
    inputs: Mutex<Vec<InputRecord>>,
}

impl ProvenanceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the collector with the page's statically-known inputs (source
    /// file, frontmatter, config, owning section) before rendering starts.
    pub fn seed(initial: Vec<InputRecord>) -> Self {
        Self {
            inputs: Mutex::new(initial),
        }
    }

    pub fn record(&self, input_type: InputType, logical_path: impl Into<String>, hash: ContentHash) {
        self.inputs
            .lock()
            .push(InputRecord::new(input_type, logical_path, hash));
    }

    pub fn record_template(&self, logical_path: impl Into<String>, hash: ContentHash) {
        self.record(InputType::Template, logical_path, hash);
    }

    pub fn record_partial(&self, logical_path: impl Into<String>, hash: ContentHash) {
        self.record(InputType::Partial, logical_path, hash);
    }

    pub fn record_data(&self, logical_path: impl Into<String>, hash: ContentHash) {
        self.record(InputType::Data, logical_path, hash);
    }

    /// Consume the collector, producing the final, deduplicated
    /// `Provenance` for this render.
    pub fn finish(self) -> Provenance {
        Provenance::from_inputs(self.inputs.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_plus_recorded_inputs_combine() {
        let seed = vec![InputRecord::new(
            InputType::Content,
            "content/a.md",
            crate::hash::hash_str("content"),
        )];
        let collector = ProvenanceCollector::seed(seed);
        collector.record_template("templates/page.html", crate::hash::hash_str("tpl"));
        collector.record_partial("templates/_nav.html", crate::hash::hash_str("nav"));

        let provenance = collector.finish();
        assert_eq!(provenance.inputs.len(), 3);
    }

    #[test]
    fn test_concurrent_recording_from_multiple_threads() {
        use std::sync::Arc;
        use std::thread;

        let collector = Arc::new(ProvenanceCollector::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let collector = collector.clone();
            handles.push(thread::spawn(move || {
                collector.record_data(format!("data/{i}.yaml"), crate::hash::hash_str(&i.to_string()));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        let collector = Arc::try_unwrap(collector).unwrap();
        assert_eq!(collector.finish().inputs.len(), 16);
    }
}
