//! Persistent, content-addressed record of every input that contributed
//! to each page's rendered output, plus the explicit collector used in
//! place of context-local dependency tracking.
//!
//! On disk, under `cache_dir/provenance/`:
//! - `records/<url-safe page_id>.json` — one [`ProvenanceRecord`] per page.
//! - `subvenance.json` — the inverse index, `input_hash -> {page_id}`.

mod collector;
mod record;
mod store;

pub use collector::ProvenanceCollector;
pub use record::{InputRecord, InputType, Provenance, ProvenanceRecord};
pub use store::ProvenanceStore;
