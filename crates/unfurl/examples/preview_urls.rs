//! Example: preview a handful of live URLs
//!
//! Run with: cargo run -p unfurl --example preview_urls

use unfurl::{build_client, preview, FetchLimits, PreviewOutcome, DEFAULT_USER_AGENT};

/// Pages worth previewing
const URLS: &[(&str, &str)] = &[
    ("https://example.com", "Simple HTML page"),
    ("https://www.rust-lang.org", "Page with Open Graph tags"),
    ("https://httpbin.org/json", "JSON endpoint (rejected as non-HTML)"),
];

#[tokio::main]
async fn main() {
    let client = build_client(DEFAULT_USER_AGENT).expect("client");
    let limits = FetchLimits::default();

    for (url, description) in URLS {
        println!("== {} ({})", url, description);
        match preview(&client, url, &limits).await {
            Ok(PreviewOutcome::Metadata(meta)) => {
                println!("   title:   {:?}", meta.title);
                println!("   desc:    {:?}", meta.description);
                println!("   image:   {:?}", meta.image);
                println!("   favicon: {:?}", meta.favicon);
            }
            Ok(PreviewOutcome::NonHtml { content_type, .. }) => {
                println!("   non-HTML: {}", content_type);
            }
            Err(e) => {
                println!("   error: {}", e);
            }
        }
        println!();
    }
}
