use crate::ingest::fingerprint;
use crate::ingest::normalize::Entry;
use crate::store::{EntityLink, NewReceipt, ReceiptStore, StoreError, WriteOutcome};

/// Outcome of writing one receipt.
///
/// The fingerprint is always available since it is derived locally; `write`
/// carries what the store said.
#[derive(Debug)]
pub struct UpsertResult {
    pub hash: String,
    pub write: Result<WriteOutcome, StoreError>,
}

/// Insert-or-ignore one receipt keyed by its fingerprint.
///
/// `Created` and `Conflict` are both steady-state results. Anything else is
/// logged here and handed back for counting; it never aborts the run.
pub async fn upsert_receipt<S>(
    store: &S,
    frontier: &str,
    source: &str,
    entry: &Entry,
) -> UpsertResult
where
    S: ReceiptStore + ?Sized,
{
    let published_at = entry.published_at_iso();
    let hash = fingerprint(&entry.link, &entry.title, &published_at);

    let receipt = NewReceipt {
        source: source.to_string(),
        title: entry.title.clone(),
        url: entry.link.clone(),
        published_at,
        frontier: frontier.to_string(),
        hash: hash.clone(),
        visible: true,
    };

    let write = store.insert_receipt(&receipt).await;
    match &write {
        Ok(outcome) => {
            tracing::debug!(hash = %hash, url = %entry.link, ?outcome, "Receipt written");
        }
        Err(e) => {
            tracing::error!(hash = %hash, url = %entry.link, error = %e, "Receipt insert failed");
        }
    }

    UpsertResult { hash, write }
}

/// Counters from linking one receipt's entities.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkSummary {
    /// Link rows written or already present
    pub linked: usize,
    /// Slugs with no matching entity row
    pub unknown: usize,
    /// Link writes rejected by the store
    pub failed: usize,
}

/// Attach entity slugs to the receipt with fingerprint `hash`.
///
/// A receipt that cannot be read back (store lag, or the insert failed) ends
/// linking silently, as do unknown slugs. A rejected link write is logged and
/// counted; the remaining slugs are still attempted. Transport errors during
/// lookups are returned so the caller can log them once for the entry.
pub async fn link_entities<S>(
    store: &S,
    hash: &str,
    slugs: &[String],
) -> Result<LinkSummary, StoreError>
where
    S: ReceiptStore + ?Sized,
{
    let mut summary = LinkSummary::default();
    if slugs.is_empty() {
        return Ok(summary);
    }

    let Some(receipt_id) = store.find_receipt_id(hash).await? else {
        return Ok(summary);
    };

    for slug in slugs {
        let Some(entity_id) = store.find_entity_id(slug).await? else {
            summary.unknown += 1;
            continue;
        };

        let link = EntityLink::mentioned(entity_id, receipt_id.clone());
        match store.insert_link(&link).await {
            Ok(_) => summary.linked += 1,
            Err(e) => {
                tracing::warn!(hash = %hash, slug = %slug, error = %e, "Entity link insert failed");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
