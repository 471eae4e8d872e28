//! Frontier feed ingestion.
//!
//! Pulls a fixed set of RSS/Atom feeds, turns the newest entries into
//! fingerprinted receipts, and writes them with their guessed entity mentions
//! into a PostgREST backend. See [`ingest::Pipeline`] for the driving loop.

pub mod config;
pub mod feed;
pub mod ingest;
pub mod store;
pub mod util;
