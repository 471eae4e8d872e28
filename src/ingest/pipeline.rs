use chrono::Utc;
use std::time::Duration;

use crate::config::{Config, FeedSource};
use crate::feed::{fetch_feed, FetchError};
use crate::ingest::normalize::normalize_entry;
use crate::ingest::receipts::{link_entities, upsert_receipt};
use crate::ingest::tagger::{EntityTagger, KeywordTagger};
use crate::store::{ReceiptStore, WriteOutcome};

/// Counters for one pass over every configured feed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    /// Entries normalized and sent to the store
    pub entries: usize,
    /// Entries dropped for lacking a title or link
    pub skipped_entries: usize,
    /// Entries stamped with the ingestion time for lack of a feed date
    pub undated_entries: usize,
    pub created: usize,
    pub conflicts: usize,
    pub write_errors: usize,
    pub links: usize,
    pub link_errors: usize,
}

impl IngestReport {
    fn absorb(&mut self, other: &IngestReport) {
        self.entries += other.entries;
        self.skipped_entries += other.skipped_entries;
        self.undated_entries += other.undated_entries;
        self.created += other.created;
        self.conflicts += other.conflicts;
        self.write_errors += other.write_errors;
        self.links += other.links;
        self.link_errors += other.link_errors;
    }
}

/// The fetch → normalize → fingerprint → upsert → link loop.
///
/// Feeds run one after another and so do their entries; nothing is spawned.
/// A failing feed is logged and skipped without affecting the others.
pub struct Pipeline<S> {
    config: Config,
    client: reqwest::Client,
    store: S,
    tagger: Box<dyn EntityTagger>,
}

impl<S: ReceiptStore> Pipeline<S> {
    /// Pipeline with the keyword tagger built from `config.entities`.
    pub fn new(config: Config, client: reqwest::Client, store: S) -> Self {
        let tagger = KeywordTagger::new(&config.entities, config.max_entities_per_receipt);
        Self::with_tagger(config, client, store, Box::new(tagger))
    }

    pub fn with_tagger(
        config: Config,
        client: reqwest::Client,
        store: S,
        tagger: Box<dyn EntityTagger>,
    ) -> Self {
        Self {
            config,
            client,
            store,
            tagger,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process every configured feed once.
    pub async fn run(&self) -> IngestReport {
        let mut report = IngestReport::default();

        for feed in &self.config.feeds {
            match self.ingest_feed(feed).await {
                Ok(feed_report) => {
                    tracing::info!(
                        feed = %feed.url,
                        frontier = %feed.category,
                        entries = feed_report.entries,
                        created = feed_report.created,
                        conflicts = feed_report.conflicts,
                        write_errors = feed_report.write_errors,
                        "Feed ingested"
                    );
                    report.feeds_ok += 1;
                    report.absorb(&feed_report);
                }
                Err(e) => {
                    tracing::warn!(feed = %feed.url, error = %e, "Skipping feed");
                    report.feeds_failed += 1;
                }
            }
        }

        tracing::info!(
            feeds_ok = report.feeds_ok,
            feeds_failed = report.feeds_failed,
            entries = report.entries,
            created = report.created,
            conflicts = report.conflicts,
            write_errors = report.write_errors,
            links = report.links,
            "Ingest run complete"
        );
        report
    }

    async fn ingest_feed(&self, feed: &FeedSource) -> Result<IngestReport, FetchError> {
        let raw_entries =
            fetch_feed(&self.client, &feed.url, self.config.max_entries_per_feed).await?;

        let mut report = IngestReport::default();
        let pause = Duration::from_millis(self.config.entry_pause_ms);

        for raw in raw_entries {
            let Some(entry) = normalize_entry(raw, Utc::now()) else {
                tracing::debug!(feed = %feed.url, "Entry without title or link, skipping");
                report.skipped_entries += 1;
                continue;
            };
            report.entries += 1;
            if !entry.dated {
                tracing::debug!(url = %entry.link, "Entry has no date, using ingestion time");
                report.undated_entries += 1;
            }

            let upsert = upsert_receipt(
                &self.store,
                &feed.category,
                &self.config.source_label,
                &entry,
            )
            .await;
            match upsert.write {
                Ok(WriteOutcome::Created) => report.created += 1,
                Ok(WriteOutcome::Conflict) => report.conflicts += 1,
                Err(_) => report.write_errors += 1,
            }

            let slugs = self.tagger.tag(&entry.title, &entry.link);
            match link_entities(&self.store, &upsert.hash, &slugs).await {
                Ok(summary) => {
                    report.links += summary.linked;
                    report.link_errors += summary.failed;
                }
                Err(e) => {
                    tracing::warn!(hash = %upsert.hash, error = %e, "Entity linking aborted");
                    report.link_errors += 1;
                }
            }

            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_sums_entry_counters() {
        let mut total = IngestReport {
            feeds_ok: 1,
            entries: 2,
            created: 2,
            ..Default::default()
        };
        total.absorb(&IngestReport {
            feeds_ok: 5,
            entries: 3,
            conflicts: 3,
            links: 1,
            ..Default::default()
        });
        assert_eq!(total.feeds_ok, 1);
        assert_eq!(total.entries, 5);
        assert_eq!(total.created, 2);
        assert_eq!(total.conflicts, 3);
        assert_eq!(total.links, 1);
    }
}
