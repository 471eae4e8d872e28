use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// A credential-bearing URL uses plain http on a non-loopback host.
    #[error("Insecure URL: HTTPS required for {0} (http allowed only on localhost)")]
    Insecure(String),
}

/// Validates a feed source URL.
///
/// Feeds are third-party documents, so any public or private http(s) host is
/// accepted. Only the scheme and the presence of a host are checked.
///
/// # Examples
///
/// ```
/// use thielverse_ingest::util::validate_feed_url;
///
/// assert!(validate_feed_url("https://openai.com/blog/rss.xml").is_ok());
/// assert!(validate_feed_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_feed_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if matches!(url.host_str(), None | Some("")) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Validates the base URL of the remote store.
///
/// Every request to the store carries the service key, so plain http is only
/// tolerated against loopback hosts (local PostgREST, test mock servers).
pub fn validate_store_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = validate_feed_url(url_str)?;

    if url.scheme() == "http" && !is_loopback(&url) {
        return Err(UrlValidationError::Insecure(
            url.host_str().unwrap_or_default().to_owned(),
        ));
    }

    Ok(url)
}

fn is_loopback(url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    if host == "localhost" {
        return true;
    }

    // Strip brackets from IPv6 addresses for parsing
    let host_for_parse = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    host_for_parse
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}
