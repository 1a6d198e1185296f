use thiserror::Error;
use url::Url;

/// Source-URL rejection reasons, surfaced before any network I/O.
#[derive(Debug, Error)]
pub enum SourceUrlError {
    /// The string does not parse as a URL (malformed, or missing a scheme).
    #[error("invalid URL '{0}': {1}")]
    Malformed(String, #[source] url::ParseError),

    /// Parsed, but the scheme is not fetchable here.
    #[error("unsupported scheme '{0}' (only http/https)")]
    UnsupportedScheme(String),

    /// Parsed, but there is no host to derive a cache directory from.
    #[error("URL '{0}' has no host component")]
    MissingHost(String),
}

/// Parses and validates a feed source URL.
///
/// Requires an http(s) scheme and a host component — the host names the
/// cache partition directory, so a hostless URL cannot be cached at all.
pub fn parse_source_url(raw: &str) -> Result<Url, SourceUrlError> {
    let url =
        Url::parse(raw).map_err(|e| SourceUrlError::Malformed(raw.to_string(), e))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(SourceUrlError::UnsupportedScheme(scheme.to_string())),
    }

    if url.host_str().is_none() {
        return Err(SourceUrlError::MissingHost(raw.to_string()));
    }

    Ok(url)
}

/// The host component used as the partition directory name.
pub fn source_host(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_string()
}
