//! Core types for Unfurl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Snapshot of the response headers the caller cares about
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, verbatim
    pub content_type: Option<String>,
}

/// Result of one fetch attempt sequence
///
/// Constructed once per fetch and consumed immediately; failures are the
/// `Err` arm of the surrounding `Result`.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The document was HTML and has been decoded to text
    Html {
        /// URL after following redirects
        final_url: Url,
        /// Decoded document, possibly truncated at the byte cap
        html: String,
        meta: ResponseMeta,
    },
    /// Content-Type was not HTML; the body was never read
    NonHtml {
        final_url: Url,
        content_type: String,
        meta: ResponseMeta,
    },
}

/// Link preview metadata for a single page
///
/// Optional fields are absent when no candidate source yielded a non-empty
/// value. `image` and `favicon` are absolute URLs resolved against
/// `final_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// The URL as requested
    pub url: String,

    /// URL after following redirects
    pub final_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Preview image, absolute URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,

    /// Open Graph object type, e.g. "article" or "website"
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Document language from the root element or og:locale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// Favicon, absolute URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,

    /// Wall-clock time extraction completed
    pub fetched_at: DateTime<Utc>,
}
