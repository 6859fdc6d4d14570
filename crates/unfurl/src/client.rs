//! Entry points for Unfurl
//!
//! `preview` runs the whole pipeline for one URL: validate, fetch with
//! limits, decode, extract. The fetch logic lives in [`fetch`](crate::fetch).

use crate::error::FetchError;
use crate::extract::extract_metadata;
use crate::fetch::{fetch_html, FetchLimits};
use crate::types::{FetchOutcome, PageMetadata};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, USER_AGENT,
};
use url::Url;

use crate::DEFAULT_USER_AGENT;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANG: &str = "ja,en-US;q=0.9,en;q=0.8";

/// What a preview run produced
#[derive(Debug)]
pub enum PreviewOutcome {
    /// Extracted link preview metadata
    Metadata(PageMetadata),
    /// The target was not an HTML document
    NonHtml {
        final_url: Url,
        content_type: String,
    },
}

/// Build the HTTP client used for page fetches
///
/// One client should be built per process and reused; it carries the
/// browser-like header set and follows redirects. Per-request deadlines
/// are applied by the fetch loop, not here.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
    );
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(FetchError::ClientBuild)
}

/// Validate a URL string as http or https
pub fn parse_http_url(input: &str) -> Result<Url, FetchError> {
    let url = Url::parse(input).map_err(|_| FetchError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(FetchError::InvalidUrl),
    }
}

/// Fetch a URL and extract its link preview metadata
pub async fn preview(
    client: &reqwest::Client,
    url: &str,
    limits: &FetchLimits,
) -> Result<PreviewOutcome, FetchError> {
    let parsed = parse_http_url(url)?;

    match fetch_html(client, &parsed, limits).await? {
        FetchOutcome::Html {
            final_url, html, ..
        } => Ok(PreviewOutcome::Metadata(extract_metadata(
            &html, url, &final_url,
        ))),
        FetchOutcome::NonHtml {
            final_url,
            content_type,
            ..
        } => Ok(PreviewOutcome::NonHtml {
            final_url,
            content_type,
        }),
    }
}
