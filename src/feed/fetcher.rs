use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use crate::util::{parse_source_url, SourceUrlError};

const MAX_RETRIES: u32 = 3;
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while retrieving feed content.
///
/// The caller gets a classified failure; retry policy for rate limits and
/// server errors lives here, in the fetch layer, not in the pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source is not a fetchable URL (malformed, missing scheme, or no
    /// host).
    #[error("invalid source URL: {0}")]
    InvalidUrl(#[from] SourceUrlError),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("failed to establish connection: {0}")]
    Connection(#[from] reqwest::Error),
    /// Request exceeded the 30-second timeout
    #[error("request timed out")]
    Timeout,
    /// Successful connection but status code outside the 200–299 window
    #[error("request was not successfully processed, status code = '{0}'")]
    HttpStatus(u16),
    /// Server returned 429 Too Many Requests after max retries
    #[error("rate limited after {0} retries")]
    RateLimited(u32),
    /// Response body exceeded the 10MB size limit
    #[error("response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// The success window is inclusive-exclusive: `199 < status < 300`.
fn is_success_status(status: u16) -> bool {
    199 < status && status < 300
}

/// Fetches raw feed bytes from a source URL.
///
/// The URL is validated before any I/O. HTTP 429 and 5xx responses are
/// retried with exponential backoff (2s, 4s, 8s); other non-success statuses
/// fail immediately. The body is streamed with a 10MB cap and checked
/// against Content-Length so a truncated transfer is retried rather than
/// parsed.
pub async fn fetch(client: &reqwest::Client, source: &str) -> Result<Vec<u8>, FetchError> {
    let url = parse_source_url(source)?;
    tracing::info!(url = %url, "Fetching feed");

    let mut retry_count = 0;

    loop {
        // The client may carry its own (configured) timeout; this is the
        // hard ceiling either way.
        let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url.clone()).send())
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::Connection(e)
                }
            })?;

        let status = response.status().as_u16();

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            if retry_count >= MAX_RETRIES {
                return Err(FetchError::RateLimited(MAX_RETRIES));
            }
            let delay_secs = 2u64.pow(retry_count);
            tracing::warn!(url = %url, retry = retry_count, delay_secs, "Rate limited, backing off");
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            retry_count += 1;
            continue;
        }

        if response.status().is_server_error() {
            if retry_count >= MAX_RETRIES {
                return Err(FetchError::HttpStatus(status));
            }
            let delay_secs = 2u64.pow(retry_count);
            tracing::warn!(url = %url, status, retry = retry_count, delay_secs, "Server error, retrying after delay");
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            retry_count += 1;
            continue;
        }

        if !is_success_status(status) {
            return Err(FetchError::HttpStatus(status));
        }

        match read_limited_bytes(response, MAX_FEED_SIZE).await {
            Ok(bytes) => return Ok(bytes),
            Err(FetchError::IncompleteResponse { expected, received }) => {
                if retry_count >= MAX_RETRIES {
                    return Err(FetchError::IncompleteResponse { expected, received });
                }
                let delay_secs = 2u64.pow(retry_count);
                tracing::debug!(
                    url = %url,
                    expected,
                    received,
                    delay_secs,
                    "Retrying incomplete download"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                retry_count += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: reject oversized bodies before streaming them.
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Connection)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    // Network interruptions can end the stream short of Content-Length; the
    // caller retries with backoff.
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
