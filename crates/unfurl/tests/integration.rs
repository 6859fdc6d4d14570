//! Integration tests for Unfurl using wiremock
//!
//! Idle-timeout behavior needs a server that stalls mid-body, which wiremock
//! cannot do, so those cases use a raw tokio listener.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use unfurl::{
    build_client, fetch_html, parse_http_url, preview, FetchError, FetchLimits, FetchOutcome,
    PreviewOutcome, DEFAULT_USER_AGENT,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_limits() -> FetchLimits {
    FetchLimits {
        ttfb_timeout: Duration::from_millis(300),
        idle_timeout: Duration::from_millis(200),
        max_html_bytes: 1_500_000,
        retries: 1,
    }
}

#[tokio::test]
async fn test_html_page_extracted() {
    let mock_server = MockServer::start().await;

    let html = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Fallback Title</title>
    <meta property="og:title" content="A Test Page">
    <meta property="og:description" content="Describes the page">
    <meta property="og:image" content="/img/cover.jpg">
    <meta property="og:site_name" content="Test Site">
    <meta property="og:type" content="website">
    <link rel="icon" href="/fav.png">
</head>
<body>hello</body>
</html>"#;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(&mock_server)
        .await;

    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = format!("{}/article", mock_server.uri());
    let outcome = preview(&client, &url, &FetchLimits::default()).await.unwrap();

    let PreviewOutcome::Metadata(meta) = outcome else {
        panic!("expected metadata");
    };
    assert_eq!(meta.url, url);
    assert_eq!(meta.final_url, url);
    assert_eq!(meta.title.as_deref(), Some("A Test Page"));
    assert_eq!(meta.description.as_deref(), Some("Describes the page"));
    assert_eq!(
        meta.image.as_deref(),
        Some(format!("{}/img/cover.jpg", mock_server.uri()).as_str())
    );
    assert_eq!(meta.site_name.as_deref(), Some("Test Site"));
    assert_eq!(meta.kind.as_deref(), Some("website"));
    assert_eq!(meta.lang.as_deref(), Some("en"));
    assert_eq!(
        meta.favicon.as_deref(),
        Some(format!("{}/fav.png", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_default_favicon_for_bare_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><head><title>Foo</title></head></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = format!("{}/bare", mock_server.uri());
    let outcome = preview(&client, &url, &FetchLimits::default()).await.unwrap();

    let PreviewOutcome::Metadata(meta) = outcome else {
        panic!("expected metadata");
    };
    assert_eq!(meta.title.as_deref(), Some("Foo"));
    assert_eq!(
        meta.favicon.as_deref(),
        Some(format!("{}/favicon.ico", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_non_html_rejected_without_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"key": "value"}"#, "application/json"),
        )
        .mount(&mock_server)
        .await;

    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = parse_http_url(&format!("{}/data.json", mock_server.uri())).unwrap();
    let outcome = fetch_html(&client, &url, &FetchLimits::default())
        .await
        .unwrap();

    match outcome {
        FetchOutcome::NonHtml { content_type, .. } => {
            assert_eq!(content_type, "application/json");
        }
        other => panic!("expected NonHtml, got {:?}", other),
    }
}

#[tokio::test]
async fn test_byte_cap_truncates_body() {
    let mock_server = MockServer::start().await;

    let body = "a".repeat(4096);
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&mock_server)
        .await;

    let limits = FetchLimits {
        max_html_bytes: 1024,
        ..FetchLimits::default()
    };
    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = parse_http_url(&format!("{}/big", mock_server.uri())).unwrap();
    let outcome = fetch_html(&client, &url, &limits).await.unwrap();

    match outcome {
        FetchOutcome::Html { html, .. } => {
            // Exactly the first max_html_bytes bytes, never more
            assert_eq!(html.len(), 1024);
            assert!(html.bytes().all(|b| b == b'a'));
        }
        other => panic!("expected Html, got {:?}", other),
    }
}

#[tokio::test]
async fn test_shift_jis_decoded_via_header_charset() {
    let mock_server = MockServer::start().await;

    let original = "<html><head><title>日本語のページ</title></head></html>";
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(original);

    Mock::given(method("GET"))
        .and(path("/sjis"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(bytes.into_owned())
                .insert_header("content-type", "text/html; charset=Shift_JIS"),
        )
        .mount(&mock_server)
        .await;

    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = format!("{}/sjis", mock_server.uri());
    let outcome = preview(&client, &url, &FetchLimits::default()).await.unwrap();

    let PreviewOutcome::Metadata(meta) = outcome else {
        panic!("expected metadata");
    };
    assert_eq!(meta.title.as_deref(), Some("日本語のページ"));
}

#[tokio::test]
async fn test_redirect_updates_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/new"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><meta property="og:image" content="pic.png"></head></html>"#,
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = format!("{}/old", mock_server.uri());
    let outcome = preview(&client, &url, &FetchLimits::default()).await.unwrap();

    let PreviewOutcome::Metadata(meta) = outcome else {
        panic!("expected metadata");
    };
    assert_eq!(meta.url, url);
    assert_eq!(meta.final_url, format!("{}/new", mock_server.uri()));
    // Relative image resolves against the post-redirect URL
    assert_eq!(
        meta.image.as_deref(),
        Some(format!("{}/pic.png", mock_server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_ttfb_timeout_retried_once_then_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html")
                .set_delay(Duration::from_millis(800)),
        )
        .expect(2) // initial attempt + exactly one retry
        .mount(&mock_server)
        .await;

    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = parse_http_url(&format!("{}/slow", mock_server.uri())).unwrap();
    let result = fetch_html(&client, &url, &quick_limits()).await;

    assert!(matches!(result, Err(FetchError::Timeout)));
}

#[tokio::test]
async fn test_retry_succeeds_after_transient_timeout() {
    let mock_server = MockServer::start().await;

    // First attempt stalls past the TTFB deadline, the retry is served fast
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html")
                .set_delay(Duration::from_millis(800)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><head><title>Recovered</title></head></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = format!("{}/flaky", mock_server.uri());
    let outcome = preview(&client, &url, &quick_limits()).await.unwrap();

    let PreviewOutcome::Metadata(meta) = outcome else {
        panic!("expected metadata");
    };
    assert_eq!(meta.title.as_deref(), Some("Recovered"));
}

/// Serve one connection: headers, an optional first chunk, then silence
async fn stalling_server(first_chunk: Option<&'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;

        let head = "HTTP/1.1 200 OK\r\n\
                    content-type: text/html; charset=utf-8\r\n\
                    transfer-encoding: chunked\r\n\
                    \r\n";
        socket.write_all(head.as_bytes()).await.unwrap();

        if let Some(chunk) = first_chunk {
            let framed = format!("{:x}\r\n{}\r\n", chunk.len(), chunk);
            socket.write_all(framed.as_bytes()).await.unwrap();
        }
        socket.flush().await.unwrap();

        // Hold the socket open so the client sees silence, not EOF
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_idle_timeout_with_data_is_soft_truncation() {
    let base = stalling_server(Some("<html><head><title>Partial</title></head>")).await;

    let limits = FetchLimits {
        retries: 0,
        ..quick_limits()
    };
    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = parse_http_url(&base).unwrap();
    let outcome = fetch_html(&client, &url, &limits).await.unwrap();

    match outcome {
        FetchOutcome::Html { html, .. } => {
            // Bytes received before the stall survive
            assert!(html.contains("Partial"));
        }
        other => panic!("expected Html, got {:?}", other),
    }
}

#[tokio::test]
async fn test_idle_timeout_with_zero_bytes_is_timeout() {
    let base = stalling_server(None).await;

    let limits = FetchLimits {
        retries: 0,
        ..quick_limits()
    };
    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = parse_http_url(&base).unwrap();
    let result = fetch_html(&client, &url, &limits).await;

    assert!(matches!(result, Err(FetchError::Timeout)));
}

#[tokio::test]
async fn test_connection_error_is_not_retried() {
    // Nothing is listening on this port
    let client = build_client(DEFAULT_USER_AGENT).unwrap();
    let url = parse_http_url("http://127.0.0.1:9").unwrap();
    let result = fetch_html(&client, &url, &quick_limits()).await;

    match result {
        Err(FetchError::Connect(_)) | Err(FetchError::Request(_)) => {}
        other => panic!("expected a terminal failure, got {:?}", other),
    }
}
