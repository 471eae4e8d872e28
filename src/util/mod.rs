//! Small shared helpers.
//!
//! - **URL validation**: scheme checks for feed sources and the credential-bearing
//!   store endpoint

mod url_validator;

pub use url_validator::{validate_feed_url, validate_store_url, UrlValidationError};
