//! Unfurl CLI - fetch a page and print its link preview metadata

use std::time::Duration;

use clap::Parser;
use unfurl::{FetchLimits, PreviewOutcome, DEFAULT_USER_AGENT};

/// Unfurl - link preview metadata tool
#[derive(Parser, Debug)]
#[command(name = "unfurl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL to preview (http or https)
    #[arg(long)]
    url: Option<String>,

    /// Time-to-first-byte timeout in milliseconds
    #[arg(long, default_value_t = 8000)]
    ttfb_timeout_ms: u64,

    /// Idle timeout between body chunks in milliseconds
    #[arg(long, default_value_t = 5000)]
    idle_timeout_ms: u64,

    /// Cap on downloaded HTML bytes
    #[arg(long, default_value_t = 1_500_000)]
    max_bytes: usize,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let url = match args.url {
        Some(url) => url,
        None => {
            eprintln!("Error: Missing required parameter: url");
            eprintln!("Usage: unfurl --url <URL>");
            std::process::exit(1);
        }
    };

    let limits = FetchLimits {
        ttfb_timeout: Duration::from_millis(args.ttfb_timeout_ms),
        idle_timeout: Duration::from_millis(args.idle_timeout_ms),
        max_html_bytes: args.max_bytes,
        ..FetchLimits::default()
    };

    let user_agent = args.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let client = match unfurl::build_client(user_agent) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match unfurl::preview(&client, &url, &limits).await {
        Ok(PreviewOutcome::Metadata(meta)) => {
            let json = serde_json::to_string_pretty(&meta).unwrap_or_else(|e| {
                eprintln!("Error serializing metadata: {}", e);
                std::process::exit(1);
            });
            println!("{}", json);
        }
        Ok(PreviewOutcome::NonHtml {
            final_url,
            content_type,
        }) => {
            eprintln!("Error: content is not HTML ({}) at {}", content_type, final_url);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
