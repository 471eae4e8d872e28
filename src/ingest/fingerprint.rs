use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest.
pub const FINGERPRINT_LEN: usize = 24;

/// Deduplication key for a receipt.
///
/// Hashes `lower(trim(url)) | date | lower(trim(title))`, where `date` is the
/// first ten characters of the ISO-8601 `published_at` (the `YYYY-MM-DD` part),
/// and keeps the first 24 hex characters. Case, surrounding whitespace and
/// time of day therefore never change the result.
pub fn fingerprint(url: &str, title: &str, published_at: &str) -> String {
    let date: String = published_at.chars().take(10).collect();
    let key = format!(
        "{}|{}|{}",
        url.trim().to_lowercase(),
        date,
        title.trim().to_lowercase()
    );

    let mut hex = format!("{:x}", Sha256::digest(key.as_bytes()));
    hex.truncate(FINGERPRINT_LEN);
    hex
}
