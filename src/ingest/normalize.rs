use chrono::{DateTime, Utc};

use crate::feed::RawEntry;

/// A feed item ready to become a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    /// False when the feed gave no date and `published_at` is the ingestion time.
    pub dated: bool,
}

impl Entry {
    /// `published_at` as RFC 3339 with an explicit `+00:00` offset.
    pub fn published_at_iso(&self) -> String {
        self.published_at.to_rfc3339()
    }
}

/// Canonicalize a raw entry.
///
/// The title is trimmed and the link kept verbatim. Entries without a feed date
/// are stamped with `now`, which moves their fingerprint's date component every
/// day they stay undated. Returns `None` when the title or link is absent.
pub fn normalize_entry(raw: RawEntry, now: DateTime<Utc>) -> Option<Entry> {
    let title = raw.title?.trim().to_string();
    let link = raw.link?;

    let (published_at, dated) = match raw.published {
        Some(ts) => (ts, true),
        None => (now, false),
    };

    Some(Entry {
        title,
        link,
        published_at,
        dated,
    })
}
