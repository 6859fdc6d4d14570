//! HTTP service around the unfurl library
//!
//! One GET endpoint returns link preview metadata as JSON, with an optional
//! API-key gate and status codes mapped from fetch outcomes.

pub mod config;
pub mod routes;

pub use config::Config;
pub use routes::{build_app, AppState};
