//! Destination tables for ingested receipts.
//!
//! The pipeline talks to the store through [`ReceiptStore`], which mirrors the
//! four calls the ingest loop needs: insert a receipt, read its id back, resolve
//! an entity slug, and insert a link row. Both inserts are insert-or-ignore; the
//! store's uniqueness constraints (`receipts.hash`, `entity_receipt(entity_id,
//! receipt_id)`) are the only deduplication mechanism.
//!
//! - [`rest::RestStore`] - PostgREST over HTTP (production)
//! - [`memory::MemoryStore`] - in-process tables with the same constraints (dry runs)

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use memory::MemoryStore;
pub use rest::RestStore;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level error (DNS, connection, TLS, timeout) or an undecodable body
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Any status other than the ones the call treats as success
    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Records
// ============================================================================

/// Identifier assigned by the store.
///
/// Tables may use bigint or uuid keys, so the value is carried opaquely and
/// written back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(id) => write!(f, "{id}"),
            RecordId::Text(id) => f.write_str(id),
        }
    }
}

/// Row written to `receipts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewReceipt {
    pub source: String,
    pub title: String,
    pub url: String,
    /// ISO-8601 UTC timestamp
    pub published_at: String,
    pub frontier: String,
    pub hash: String,
    pub visible: bool,
}

/// Row written to `entity_receipt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityLink {
    pub entity_id: RecordId,
    pub receipt_id: RecordId,
    pub role: String,
}

impl EntityLink {
    pub const ROLE_MENTIONED: &'static str = "mentioned";

    pub fn mentioned(entity_id: RecordId, receipt_id: RecordId) -> Self {
        Self {
            entity_id,
            receipt_id,
            role: Self::ROLE_MENTIONED.to_string(),
        }
    }
}

/// Successful result of an insert-or-ignore write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new row was created
    Created,
    /// The unique key already existed; nothing changed
    Conflict,
}

// ============================================================================
// Store Trait
// ============================================================================

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Insert a receipt unless one with the same `hash` exists.
    async fn insert_receipt(&self, receipt: &NewReceipt) -> Result<WriteOutcome, StoreError>;

    /// Look up a receipt's id by fingerprint.
    async fn find_receipt_id(&self, hash: &str) -> Result<Option<RecordId>, StoreError>;

    /// Look up an entity's id by slug.
    async fn find_entity_id(&self, slug: &str) -> Result<Option<RecordId>, StoreError>;

    /// Insert an entity/receipt link unless the pair already exists.
    async fn insert_link(&self, link: &EntityLink) -> Result<WriteOutcome, StoreError>;
}
