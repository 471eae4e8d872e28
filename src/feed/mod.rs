//! Feed retrieval for RSS/Atom sources.
//!
//! - [`parser`] - Turns a feed document into [`RawEntry`] values using `feed-rs`
//! - [`fetcher`] - HTTP retrieval with a size cap, feeding the parser
//!
//! Fetching is deliberately one-shot: no retries, no conditional requests. A
//! failing source surfaces a [`FetchError`] and the caller decides how to proceed.

pub mod fetcher;
pub mod parser;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, RawEntry};
