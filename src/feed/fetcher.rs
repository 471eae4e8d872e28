use crate::feed::parser::{parse_feed, RawEntry};
use futures::StreamExt;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving a single feed.
///
/// Any of these aborts only the feed that produced it; the pipeline moves on
/// to the next source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, timeout)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Fetches a feed and returns at most `limit` raw entries in document order.
///
/// The request timeout comes from `client`. No retries are attempted: a failed
/// fetch is reported to the caller, which logs it and skips the source.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection, TLS or timeout errors
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
/// - [`FetchError::IncompleteResponse`] - Body shorter than Content-Length
/// - [`FetchError::Parse`] - Invalid RSS/Atom XML
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    limit: usize,
) -> Result<Vec<RawEntry>, FetchError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    let entries = parse_feed(&bytes, limit).map_err(|e| FetchError::Parse(e.to_string()))?;

    tracing::debug!(feed = %url, entries = entries.len(), "Fetched feed");
    Ok(entries)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss_with_items(n: usize) -> String {
        let items: String = (0..n)
            .map(|i| {
                format!(
                    "<item><title>Item {i}</title><link>https://example.com/{i}</link></item>"
                )
            })
            .collect();
        format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title>{items}</channel></rss>"#)
    }

    async fn serve(body: String, status: u16) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_string(body)
                    .insert_header("Content-Type", "application/rss+xml"),
            )
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = serve(rss_with_items(2), 200).await;
        let client = reqwest::Client::new();

        let entries = fetch_feed(&client, &format!("{}/feed", mock_server.uri()), 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/0"));
    }

    #[tokio::test]
    async fn test_fetch_takes_first_ten_in_order() {
        let mock_server = serve(rss_with_items(15), 200).await;
        let client = reqwest::Client::new();

        let entries = fetch_feed(&client, &format!("{}/feed", mock_server.uri()), 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[0].title.as_deref(), Some("Item 0"));
        assert_eq!(entries[9].title.as_deref(), Some("Item 9"));
    }

    #[tokio::test]
    async fn test_fetch_404_error() {
        let mock_server = serve(String::new(), 404).await;
        let client = reqwest::Client::new();

        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri()), 10).await;
        assert!(matches!(result, Err(FetchError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_fetch_invalid_xml() {
        let mock_server = serve("not xml at all".to_string(), 200).await;
        let client = reqwest::Client::new();

        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri()), 10).await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let client = reqwest::Client::new();
        // Port 9 (discard) on loopback is not served by anything in the test environment
        let result = fetch_feed(&client, "http://127.0.0.1:9/feed", 10).await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
