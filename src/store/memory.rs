use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{EntityLink, NewReceipt, ReceiptStore, RecordId, StoreError, WriteOutcome};

#[derive(Default)]
struct Tables {
    next_id: i64,
    receipts: Vec<(RecordId, NewReceipt)>,
    entities: HashMap<String, RecordId>,
    links: Vec<EntityLink>,
}

impl Tables {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId::Int(self.next_id)
    }
}

/// In-process store enforcing the same uniqueness rules as the remote tables.
///
/// Backs `--dry-run`: a full pass executes against it so the run summary shows
/// what would have been written, without touching the network.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-provisioned with the given entity slugs.
    pub fn with_entities<I, S>(slugs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut tables = store.lock();
            for slug in slugs {
                let slug = slug.into();
                if !tables.entities.contains_key(&slug) {
                    let id = tables.allocate_id();
                    tables.entities.insert(slug, id);
                }
            }
        }
        store
    }

    /// Receipts in insertion order.
    pub fn receipts(&self) -> Vec<NewReceipt> {
        self.lock()
            .receipts
            .iter()
            .map(|(_, receipt)| receipt.clone())
            .collect()
    }

    /// Links in insertion order.
    pub fn links(&self) -> Vec<EntityLink> {
        self.lock().links.clone()
    }

    pub fn entity_id(&self, slug: &str) -> Option<RecordId> {
        self.lock().entities.get(slug).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // Every mutation is a single push, so a poisoned lock still guards consistent tables
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReceiptStore for MemoryStore {
    async fn insert_receipt(&self, receipt: &NewReceipt) -> Result<WriteOutcome, StoreError> {
        let mut tables = self.lock();
        if tables.receipts.iter().any(|(_, r)| r.hash == receipt.hash) {
            return Ok(WriteOutcome::Conflict);
        }
        let id = tables.allocate_id();
        tables.receipts.push((id, receipt.clone()));
        Ok(WriteOutcome::Created)
    }

    async fn find_receipt_id(&self, hash: &str) -> Result<Option<RecordId>, StoreError> {
        Ok(self
            .lock()
            .receipts
            .iter()
            .find(|(_, r)| r.hash == hash)
            .map(|(id, _)| id.clone()))
    }

    async fn find_entity_id(&self, slug: &str) -> Result<Option<RecordId>, StoreError> {
        Ok(self.entity_id(slug))
    }

    async fn insert_link(&self, link: &EntityLink) -> Result<WriteOutcome, StoreError> {
        let mut tables = self.lock();
        let exists = tables
            .links
            .iter()
            .any(|l| l.entity_id == link.entity_id && l.receipt_id == link.receipt_id);
        if exists {
            return Ok(WriteOutcome::Conflict);
        }
        tables.links.push(link.clone());
        Ok(WriteOutcome::Created)
    }
}
