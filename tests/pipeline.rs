//! Integration tests for a full ingest pass against mocked feeds.
//!
//! Feeds are served by wiremock; receipts land in a `MemoryStore`, which
//! enforces the same uniqueness rules as the remote tables.

use pretty_assertions::assert_eq;
use thielverse_ingest::config::{Config, FeedSource, KeywordRule};
use thielverse_ingest::ingest::{fingerprint, EntityTagger, Pipeline};
use thielverse_ingest::store::{MemoryStore, RecordId};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPENAI_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>OpenAI Blog</title>
    <item>
        <title> OpenAI Ships Update </title>
        <link>https://openai.com/blog/x</link>
        <pubDate>Tue, 05 Mar 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
        <title>Sam Altman on Helion and Tesla</title>
        <link>https://openai.com/blog/y</link>
        <pubDate>Wed, 06 Mar 2024 15:30:00 GMT</pubDate>
    </item>
    <item>
        <title>Nothing to see</title>
        <link>https://example.com/z</link>
        <pubDate>Thu, 07 Mar 2024 08:00:00 GMT</pubDate>
    </item>
</channel></rss>"#;

const ENERGY_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Energy</title>
  <id>urn:energy</id>
  <updated>2024-03-08T09:00:00Z</updated>
  <entry>
    <title>Fusion milestone</title>
    <id>urn:energy:1</id>
    <link href="https://energy.example.com/fusion"/>
    <published>2024-03-08T09:00:00Z</published>
  </entry>
</feed>"#;

async fn feed_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/openai.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OPENAI_RSS))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/energy.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ENERGY_ATOM))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbage.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;
    server
}

fn config_for(server: &MockServer, feeds: &[(&str, &str)]) -> Config {
    Config {
        entry_pause_ms: 0,
        feeds: feeds
            .iter()
            .map(|(category, p)| FeedSource::new(*category, format!("{}{}", server.uri(), p)))
            .collect(),
        ..Config::default()
    }
}

fn store() -> MemoryStore {
    MemoryStore::with_entities(["openai", "anthropic", "helion", "tesla", "sama"])
}

#[tokio::test]
async fn test_end_to_end_openai_entry() {
    let server = feed_server().await;
    let pipeline = Pipeline::new(
        config_for(&server, &[("AI", "/openai.xml")]),
        reqwest::Client::new(),
        store(),
    );

    let report = pipeline.run().await;
    assert_eq!(report.feeds_ok, 1);
    assert_eq!(report.entries, 3);
    assert_eq!(report.created, 3);

    let receipts = pipeline.store().receipts();
    let first = &receipts[0];
    assert_eq!(first.title, "OpenAI Ships Update");
    assert_eq!(first.url, "https://openai.com/blog/x");
    assert_eq!(first.frontier, "AI");
    assert_eq!(first.source, "rss");
    assert!(first.visible);
    assert_eq!(
        first.hash,
        fingerprint(
            "https://openai.com/blog/x",
            "OpenAI Ships Update",
            "2024-03-05T00:00:00+00:00"
        )
    );
    assert_eq!(first.hash, "4484badca4d7c86384697eea");

    // Entry 1 → openai; entry 2 → openai (from link), helion, tesla, sama; entry 3 → none
    let links = pipeline.store().links();
    assert_eq!(report.links, 5);
    assert_eq!(links.len(), 5);
    assert!(links.iter().all(|l| l.role == "mentioned"));
    assert_eq!(links[0].entity_id, pipeline.store().entity_id("openai").unwrap());
    assert_eq!(links[0].receipt_id, RecordId::Int(6));
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = feed_server().await;
    let pipeline = Pipeline::new(
        config_for(&server, &[("AI", "/openai.xml"), ("Energy", "/energy.xml")]),
        reqwest::Client::new(),
        store(),
    );

    let first = pipeline.run().await;
    let receipts_after_first = pipeline.store().receipts();
    let links_after_first = pipeline.store().links();

    let second = pipeline.run().await;

    assert_eq!(first.created, 4);
    assert_eq!(second.created, 0);
    assert_eq!(second.conflicts, 4);
    assert_eq!(pipeline.store().receipts(), receipts_after_first);
    assert_eq!(pipeline.store().links(), links_after_first);

    let mut hashes: Vec<_> = receipts_after_first.iter().map(|r| r.hash.clone()).collect();
    hashes.sort();
    hashes.dedup();
    assert_eq!(hashes.len(), receipts_after_first.len());
}

#[tokio::test]
async fn test_failing_feed_does_not_stop_the_run() {
    let server = feed_server().await;
    let pipeline = Pipeline::new(
        config_for(
            &server,
            &[
                ("AI", "/broken.xml"),
                ("AI", "/garbage.xml"),
                ("Energy", "/energy.xml"),
            ],
        ),
        reqwest::Client::new(),
        store(),
    );

    let report = pipeline.run().await;
    assert_eq!(report.feeds_failed, 2);
    assert_eq!(report.feeds_ok, 1);

    let receipts = pipeline.store().receipts();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].frontier, "Energy");
    assert_eq!(receipts[0].url, "https://energy.example.com/fusion");
    assert_eq!(receipts[0].published_at, "2024-03-08T09:00:00+00:00");
}

#[tokio::test]
async fn test_entry_limit_applies_per_feed() {
    let server = feed_server().await;
    let config = Config {
        max_entries_per_feed: 1,
        ..config_for(&server, &[("AI", "/openai.xml"), ("Energy", "/energy.xml")])
    };
    let pipeline = Pipeline::new(config, reqwest::Client::new(), store());

    let report = pipeline.run().await;
    assert_eq!(report.entries, 2);
    let titles: Vec<_> = pipeline
        .store()
        .receipts()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["OpenAI Ships Update", "Fusion milestone"]);
}

#[tokio::test]
async fn test_custom_vocabulary_and_tagger() {
    struct FixedTagger;
    impl EntityTagger for FixedTagger {
        fn tag(&self, _title: &str, _link: &str) -> Vec<String> {
            vec!["anthropic".to_string(), "unprovisioned".to_string()]
        }
    }

    let server = feed_server().await;
    let config = Config {
        entities: vec![KeywordRule::new("fusion", "helion")],
        ..config_for(&server, &[("Energy", "/energy.xml")])
    };

    let keyword = Pipeline::new(config.clone(), reqwest::Client::new(), store());
    keyword.run().await;
    let links = keyword.store().links();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].entity_id, keyword.store().entity_id("helion").unwrap());

    let fixed = Pipeline::with_tagger(config, reqwest::Client::new(), store(), Box::new(FixedTagger));
    let report = fixed.run().await;
    assert_eq!(report.links, 1);
    assert_eq!(report.link_errors, 0);
    assert_eq!(
        fixed.store().links()[0].entity_id,
        fixed.store().entity_id("anthropic").unwrap()
    );
}
