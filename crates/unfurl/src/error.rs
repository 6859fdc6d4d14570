//! Error types for Unfurl

use thiserror::Error;

/// Errors that can occur during fetch operations
#[derive(Debug, Error)]
pub enum FetchError {
    /// URL is missing, unparseable, or not http/https
    #[error("invalid url")]
    InvalidUrl,

    /// Headers never arrived, or the body stalled before the first byte
    #[error("timeout")]
    Timeout,

    /// Failed to connect to server
    #[error("failed to connect to server")]
    Connect(#[source] reqwest::Error),

    /// Other request error, surfaced with the transport's message
    #[error("{0}")]
    Request(String),

    /// Failed to build HTTP client
    #[error("failed to create HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

impl FetchError {
    /// Classify an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err)
        } else {
            FetchError::Request(err.to_string())
        }
    }

    /// True for failures that qualify for the single retry
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}
