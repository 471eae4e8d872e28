use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Link};
use feed_rs::parser;

/// One feed item as it appears in the document, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// Parse an RSS or Atom document into raw entries, keeping document order.
///
/// At most `limit` entries are returned, taken from the head of the feed.
pub fn parse_feed(bytes: &[u8], limit: usize) -> Result<Vec<RawEntry>, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    Ok(feed
        .entries
        .into_iter()
        .take(limit)
        .map(raw_entry)
        .collect())
}

fn raw_entry(entry: Entry) -> RawEntry {
    RawEntry {
        title: entry.title.map(|t| t.content),
        link: primary_link(&entry.links).map(|l| l.href.clone()),
        published: entry.published.or(entry.updated),
    }
}

/// The entry's canonical link: the first `alternate` (or rel-less) link, else the first one.
fn primary_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
}
