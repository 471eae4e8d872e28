//! The ingest pipeline proper.
//!
//! Each entry flows through the stages in order:
//!
//! 1. [`normalize`] - trim the title, resolve the publication timestamp
//! 2. [`mod@fingerprint`] - derive the 24-hex-char deduplication key
//! 3. [`receipts::upsert_receipt`] - insert-or-ignore into `receipts`
//! 4. [`tagger`] - guess mentioned entity slugs
//! 5. [`receipts::link_entities`] - insert-or-ignore into `entity_receipt`
//!
//! [`pipeline::Pipeline`] drives the stages over every configured feed.

pub mod fingerprint;
pub mod normalize;
pub mod pipeline;
pub mod receipts;
pub mod tagger;

pub use fingerprint::fingerprint;
pub use normalize::{normalize_entry, Entry};
pub use pipeline::{IngestReport, Pipeline};
pub use receipts::{link_entities, upsert_receipt, LinkSummary, UpsertResult};
pub use tagger::{EntityTagger, KeywordTagger};
