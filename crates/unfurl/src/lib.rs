//! Unfurl - link preview metadata library
//!
//! Fetches a remote HTML document under strict time and size bounds,
//! resolves its character encoding, and extracts Open Graph / Twitter-card /
//! fallback metadata for link previews.

mod client;
mod encoding;
mod error;
mod extract;
mod fetch;
mod types;

pub use client::{build_client, parse_http_url, preview, PreviewOutcome};
pub use encoding::{decode_html, resolve_encoding, EncodingDecision, EncodingSource};
pub use error::FetchError;
pub use extract::extract_metadata;
pub use fetch::{fetch_html, FetchLimits};
pub use types::{FetchOutcome, PageMetadata, ResponseMeta};

/// Default User-Agent string
///
/// Browser-like on purpose: a number of sites refuse or degrade responses
/// for obvious bot agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123 Safari/537.36";
