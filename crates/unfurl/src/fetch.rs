//! Streaming HTML fetcher
//!
//! Retrieval of an untrusted remote document under three bounds: a
//! time-to-first-byte deadline, an idle deadline between body chunks, and a
//! cumulative byte cap. The idle deadline and the cap are soft limits once
//! data has arrived; only a fetch that never produced a byte can time out
//! hard. A timeout is retried exactly once with a jittered backoff.

use crate::encoding::decode_html;
use crate::error::FetchError;
use crate::types::{FetchOutcome, ResponseMeta};
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Limits applied to a single fetch
#[derive(Debug, Clone)]
pub struct FetchLimits {
    /// Deadline for response headers (time to first byte)
    pub ttfb_timeout: Duration,
    /// Maximum gap between successive body chunks
    pub idle_timeout: Duration,
    /// Cap on accumulated HTML bytes; exceeding it truncates, not fails
    pub max_html_bytes: usize,
    /// Extra attempts allowed after a timeout
    pub retries: u32,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            ttfb_timeout: Duration::from_millis(8000),
            idle_timeout: Duration::from_millis(5000),
            max_html_bytes: 1_500_000,
            retries: 1,
        }
    }
}

/// Fetch a URL and decode its HTML body
///
/// Timeouts (headers never arriving, or a body that stalls before the first
/// byte) are retried once after a 200-500 ms jittered backoff. Every other
/// failure is terminal on first occurrence.
pub async fn fetch_html(
    client: &reqwest::Client,
    url: &Url,
    limits: &FetchLimits,
) -> Result<FetchOutcome, FetchError> {
    let mut last_err = None;

    for attempt in 0..=limits.retries {
        if attempt > 0 {
            let backoff = Duration::from_millis(200 + fastrand::u64(..300));
            debug!(attempt, backoff_ms = backoff.as_millis() as u64, "retrying after timeout");
            tokio::time::sleep(backoff).await;
        }

        match fetch_once(client, url, limits).await {
            Ok(outcome) => return Ok(outcome),
            Err(err) if err.is_timeout() && attempt < limits.retries => {
                warn!(url = %url, attempt, "fetch timed out, will retry");
                last_err = Some(err);
            }
            Err(err) => return Err(err),
        }
    }

    Err(last_err.unwrap_or(FetchError::Timeout))
}

async fn fetch_once(
    client: &reqwest::Client,
    url: &Url,
    limits: &FetchLimits,
) -> Result<FetchOutcome, FetchError> {
    // The TTFB deadline covers connect, redirects and response headers.
    // It ends the moment headers arrive; the body read has its own clock.
    let response = tokio::time::timeout(limits.ttfb_timeout, client.get(url.clone()).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::from_reqwest)?;

    let final_url = response.url().clone();
    let meta = ResponseMeta {
        status: response.status().as_u16(),
        content_type: response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
    };

    let content_type = meta.content_type.clone().unwrap_or_default();
    if !content_type.to_ascii_lowercase().contains("text/html") {
        debug!(url = %final_url, content_type = %content_type, "non-HTML response, body unread");
        return Ok(FetchOutcome::NonHtml {
            final_url,
            content_type,
            meta,
        });
    }

    let (buffer, end) = read_body_capped(response, limits).await;
    match end {
        BodyEnd::Complete => {}
        BodyEnd::Idle if buffer.is_empty() => return Err(FetchError::Timeout),
        BodyEnd::Idle => {
            warn!(url = %final_url, bytes = buffer.len(), "idle timeout, keeping partial body");
        }
        BodyEnd::Capped => {
            warn!(url = %final_url, cap = limits.max_html_bytes, "byte cap reached, truncating body");
        }
        BodyEnd::Failed(err) => return Err(err),
    }

    let (html, decision) = decode_html(&buffer, meta.content_type.as_deref());
    debug!(
        url = %final_url,
        bytes = buffer.len(),
        encoding = decision.encoding.name(),
        source = ?decision.source,
        "decoded body"
    );

    Ok(FetchOutcome::Html {
        final_url,
        html,
        meta,
    })
}

/// How the body read loop ended
enum BodyEnd {
    /// Stream finished normally
    Complete,
    /// No chunk arrived before the idle deadline
    Idle,
    /// Byte cap reached; buffer truncated to exactly the cap
    Capped,
    /// Transport error mid-stream
    Failed(FetchError),
}

/// Stream the body, racing each chunk against the idle deadline
///
/// Accumulated bytes are never discarded; the caller decides whether the
/// ending is soft or hard.
async fn read_body_capped(response: reqwest::Response, limits: &FetchLimits) -> (Vec<u8>, BodyEnd) {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    loop {
        // Recreated per iteration: receiving a chunk resets the deadline
        let idle = tokio::time::sleep(limits.idle_timeout);
        tokio::pin!(idle);

        tokio::select! {
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    body.extend_from_slice(&bytes);
                    if body.len() > limits.max_html_bytes {
                        body.truncate(limits.max_html_bytes);
                        return (body, BodyEnd::Capped);
                    }
                }
                Some(Err(err)) => {
                    return (body, BodyEnd::Failed(FetchError::from_reqwest(err)));
                }
                None => return (body, BodyEnd::Complete),
            },
            _ = &mut idle => return (body, BodyEnd::Idle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = FetchLimits::default();
        assert_eq!(limits.ttfb_timeout, Duration::from_millis(8000));
        assert_eq!(limits.idle_timeout, Duration::from_millis(5000));
        assert_eq!(limits.max_html_bytes, 1_500_000);
        assert_eq!(limits.retries, 1);
    }
}
