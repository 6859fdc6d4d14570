//! Server configuration loaded once at process start
//!
//! Core logic never reads the environment; everything flows through this
//! struct.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use unfurl::FetchLimits;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port
    pub port: u16,
    /// Allowed API keys; empty disables the gate entirely
    pub api_keys: Vec<String>,
    /// Fetch tunables, defaults unless overridden
    pub limits: FetchLimits,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Recognized: `PORT`, `API_KEYS` (comma-separated), `TTFB_TIMEOUT_MS`,
    /// `READ_IDLE_TIMEOUT_MS`, `MAX_HTML_BYTES`.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .context("PORT must be a valid number")?;

        let api_keys = env::var("API_KEYS")
            .map(|raw| parse_key_list(&raw))
            .unwrap_or_default();

        let mut limits = FetchLimits::default();
        if let Some(ms) = env_u64("TTFB_TIMEOUT_MS")? {
            limits.ttfb_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("READ_IDLE_TIMEOUT_MS")? {
            limits.idle_timeout = Duration::from_millis(ms);
        }
        if let Some(bytes) = env_u64("MAX_HTML_BYTES")? {
            limits.max_html_bytes = bytes as usize;
        }

        Ok(Self {
            port,
            api_keys,
            limits,
        })
    }
}

fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value
                .parse()
                .with_context(|| format!("{name} must be a number"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}
