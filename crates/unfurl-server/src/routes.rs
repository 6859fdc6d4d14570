//! Request handling and status mapping

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;
use unfurl::{FetchError, PreviewOutcome};

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/og", get(og_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct OgParams {
    #[serde(default)]
    url: String,
    key: Option<String>,
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn og_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<OgParams>,
) -> Response {
    if !key_allowed(&state.config.api_keys, &headers, params.key.as_deref()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "unauthorized",
                "message": "Valid API key required in X-API-Key header or 'key' query parameter",
            })),
        )
            .into_response();
    }

    match unfurl::preview(&state.client, &params.url, &state.config.limits).await {
        Ok(PreviewOutcome::Metadata(meta)) => {
            info!(url = %params.url, final_url = %meta.final_url, "preview ok");
            let mut response = (StatusCode::OK, Json(meta)).into_response();
            let response_headers = response.headers_mut();
            response_headers.insert(
                header::CACHE_CONTROL,
                HeaderValue::from_static("public, max-age=86400"),
            );
            response_headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
            response
        }
        Ok(PreviewOutcome::NonHtml {
            final_url,
            content_type,
        }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "content is not HTML",
                "url": params.url,
                "finalUrl": final_url.to_string(),
                "contentType": content_type,
            })),
        )
            .into_response(),
        Err(FetchError::InvalidUrl) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid url" })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(json!({
                "error": err.to_string(),
                "url": params.url,
            })),
        )
            .into_response(),
    }
}

/// Check the request against the configured key set
///
/// An empty key set disables the gate; otherwise the `X-API-Key` header is
/// consulted first, then the `key` query parameter.
fn key_allowed(configured: &[String], headers: &HeaderMap, query_key: Option<&str>) -> bool {
    if configured.is_empty() {
        return true;
    }

    let presented = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or(query_key);

    match presented {
        Some(key) => configured.iter().any(|k| k == key),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_empty_key_set_bypasses_gate() {
        let headers = HeaderMap::new();
        assert!(key_allowed(&[], &headers, None));
        assert!(key_allowed(&[], &headers, Some("anything")));
    }

    #[test]
    fn test_header_key_checked() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("secret"));
        assert!(key_allowed(&keys(&["secret", "other"]), &headers, None));
        assert!(!key_allowed(&keys(&["nope"]), &headers, None));
    }

    #[test]
    fn test_query_key_checked() {
        let headers = HeaderMap::new();
        assert!(key_allowed(&keys(&["secret"]), &headers, Some("secret")));
        assert!(!key_allowed(&keys(&["secret"]), &headers, Some("wrong")));
        assert!(!key_allowed(&keys(&["secret"]), &headers, None));
    }

    #[test]
    fn test_header_takes_precedence_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_static("wrong"));
        // A wrong header is not rescued by a correct query key
        assert!(!key_allowed(&keys(&["secret"]), &headers, Some("secret")));
    }
}
