//! Pipeline configuration.
//!
//! Two layers feed a run:
//!
//! - [`Config`]: the feed registry, keyword vocabulary and pacing knobs. Built-in
//!   defaults cover the production feed list; an optional TOML file overrides any
//!   subset of keys.
//! - [`Credentials`]: the store base URL and service key, read from the
//!   environment only.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::util::{validate_feed_url, validate_store_url, UrlValidationError};

/// Environment variable holding the store base URL.
pub const ENV_STORE_URL: &str = "SUPABASE_URL";
/// Environment variable holding the service-role key.
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Missing required environment variable {0}")]
    MissingEnv(&'static str),

    #[error("Invalid URL for {what}: {source}")]
    InvalidUrl {
        what: String,
        #[source]
        source: UrlValidationError,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// One entry of the feed registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedSource {
    /// Frontier category stamped on every receipt from this feed ("AI", "Energy", ...).
    pub category: String,
    pub url: String,
}

impl FeedSource {
    pub fn new(category: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            url: url.into(),
        }
    }
}

/// Maps a lowercase keyword found in entry text to an entity slug.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub slug: String,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            slug: slug.into(),
        }
    }
}

/// Top-level pipeline configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Note that `feeds` and `entities` replace the defaults wholesale when present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Value written to `receipts.source`.
    pub source_label: String,

    /// Entries taken from the head of each feed, in document order.
    pub max_entries_per_feed: usize,

    /// Cap on entity slugs linked to a single receipt.
    pub max_entities_per_receipt: usize,

    /// Pause after each entry, a crude rate limit against the store.
    pub entry_pause_ms: u64,

    /// Per-request timeout applied to feed and store calls.
    pub request_timeout_secs: u64,

    pub feeds: Vec<FeedSource>,

    pub entities: Vec<KeywordRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_label: "rss".to_string(),
            max_entries_per_feed: 10,
            max_entities_per_receipt: 4,
            entry_pause_ms: 100,
            request_timeout_secs: 10,
            feeds: default_feeds(),
            entities: default_entities(),
        }
    }
}

fn default_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource::new("AI", "https://openai.com/blog/rss.xml"),
        FeedSource::new("AI", "https://www.anthropic.com/news/rss.xml"),
        FeedSource::new("Energy", "https://www.helionenergy.com/feed/"),
        FeedSource::new("Biotech", "https://www.altoslabs.com/news/feed/"),
        FeedSource::new("Thielverse", "https://ir.tesla.com/press-releases/feed"),
    ]
}

fn default_entities() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new("openai", "openai"),
        KeywordRule::new("anthropic", "anthropic"),
        KeywordRule::new("helion", "helion"),
        KeywordRule::new("tesla", "tesla"),
        KeywordRule::new("altos", "altos"),
        KeywordRule::new("altman", "sama"),
        KeywordRule::new("sama", "sama"),
    ]
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "source_label",
        "max_entries_per_feed",
        "max_entities_per_receipt",
        "entry_pause_ms",
        "request_timeout_secs",
        "feeds",
        "entities",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Semantic problems → `Err(ConfigError::Invalid)`, bad URLs → `Err(ConfigError::InvalidUrl)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feeds = config.feeds.len(),
            keywords = config.entities.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load a configuration file the operator named explicitly.
    ///
    /// Same as [`Config::load`] except that a missing file is an error
    /// (`ConfigError::Io`) rather than a silent fall back to the defaults.
    pub fn load_required(path: &Path) -> Result<Self, ConfigError> {
        std::fs::metadata(path)?;
        Self::load(path)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feeds.is_empty() {
            return Err(ConfigError::Invalid("at least one feed is required".into()));
        }
        if self.max_entries_per_feed == 0 {
            return Err(ConfigError::Invalid(
                "max_entries_per_feed must be greater than zero".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.source_label.trim().is_empty() {
            return Err(ConfigError::Invalid("source_label must not be empty".into()));
        }

        for feed in &self.feeds {
            if feed.category.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "feed {} has an empty category",
                    feed.url
                )));
            }
            validate_feed_url(&feed.url).map_err(|source| ConfigError::InvalidUrl {
                what: format!("feed ({})", feed.category),
                source,
            })?;
        }

        for rule in &self.entities {
            if rule.keyword.trim().is_empty() || rule.slug.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "entity rule {:?} -> {:?} must have a keyword and a slug",
                    rule.keyword, rule.slug
                )));
            }
        }

        Ok(())
    }

    /// Every distinct slug the vocabulary can produce, in vocabulary order.
    pub fn entity_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = Vec::new();
        for rule in &self.entities {
            if !slugs.contains(&rule.slug) {
                slugs.push(rule.slug.clone());
            }
        }
        slugs
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Store location and service-role key.
///
/// The key is held as a [`SecretString`], so `Debug` output never reveals it.
#[derive(Debug)]
pub struct Credentials {
    pub base_url: Url,
    pub service_key: SecretString,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup.
    ///
    /// Empty or whitespace-only values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };

        let raw_url = required(ENV_STORE_URL)?;
        let key = required(ENV_SERVICE_KEY)?;

        let base_url = validate_store_url(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            what: ENV_STORE_URL.to_string(),
            source,
        })?;

        Ok(Self {
            base_url,
            service_key: SecretString::from(key),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
