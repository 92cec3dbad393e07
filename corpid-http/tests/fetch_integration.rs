mod common;

use std::time::Duration;

use corpid_common::FetchSettings;
use corpid_http::charset::CharsetSource;
use corpid_http::{FetchError, FetchResponse, HtmlFetcher};
use encoding_rs::SHIFT_JIS;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{any, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(settings: FetchSettings) -> HtmlFetcher {
    HtmlFetcher::new(settings).expect("build fetcher")
}

async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn invalid_url_never_reaches_the_network() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let f = fetcher(FetchSettings::default());
    let ftp = server.uri().replacen("http", "ftp", 1);
    for raw in ["not a url", "/relative/path", ftp.as_str()] {
        let err = f.fetch(raw).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }), "{raw}: {err}");
        assert_eq!(err.status_code(), 400);
    }
}

#[tokio::test]
async fn sends_browser_headers_and_parses_page() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Acme Inc｜Official Site</title>
               <meta property="og:site_name" content="Acme"></head>
               <body><main>We make   widgets.</main></body></html>"#,
            "text/html; charset=utf-8",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let doc = fetcher(FetchSettings::default())
        .fetch(&format!("{}/", server.uri()))
        .await
        .expect("fetch ok");

    let received = server.received_requests().await.expect("recording enabled");
    let accept_language = received[0]
        .headers
        .get("accept-language")
        .and_then(|v| v.to_str().ok());
    assert_eq!(accept_language, Some("ja,en-US;q=0.7,en;q=0.3"));

    assert_eq!(doc.title, "Acme Inc｜Official Site");
    assert_eq!(doc.meta.get("og:site_name").map(String::as_str), Some("Acme"));
    assert_eq!(doc.content, "We make widgets.");
    assert_eq!(doc.declared_charset.as_deref(), Some("utf-8"));
    assert_eq!(doc.charset.source, CharsetSource::Header);
}

#[tokio::test]
async fn slow_server_yields_timeout() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    serve(
        &server,
        "/slow",
        ResponseTemplate::new(200)
            .set_body_raw("<title>late</title>", "text/html")
            .set_delay(Duration::from_millis(1500)),
    )
    .await;

    let settings = FetchSettings {
        timeout_ms: 150,
        ..Default::default()
    };
    let err = fetcher(settings)
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Timeout { budget_ms: 150, .. }), "{err}");
    assert!(err.is_retryable());
    assert_eq!(FetchResponse::from_result(&Err(err)).status, 504);
}

#[tokio::test]
async fn cancellation_aborts_the_fetch() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        ResponseTemplate::new(200)
            .set_body_raw("<title>never</title>", "text/html")
            .set_delay(Duration::from_millis(1500)),
    )
    .await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = fetcher(FetchSettings::default())
        .fetch_with_cancel(&format!("{}/", server.uri()), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Cancelled { .. }), "{err}");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    serve(&server, "/missing", ResponseTemplate::new(404)).await;
    serve(&server, "/boom", ResponseTemplate::new(503)).await;

    let f = fetcher(FetchSettings::default());
    let missing = f.fetch(&format!("{}/missing", server.uri())).await.unwrap_err();
    assert!(matches!(missing, FetchError::HttpStatus { status: 404, .. }));
    assert_eq!(missing.status_code(), 404);

    let boom = f.fetch(&format!("{}/boom", server.uri())).await.unwrap_err();
    assert!(matches!(boom, FetchError::HttpStatus { status: 503, .. }));
    assert_eq!(boom.status_code(), 500);
    assert!(!boom.is_retryable());
}

#[tokio::test]
async fn non_html_content_is_rejected() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    serve(
        &server,
        "/api",
        ResponseTemplate::new(200).set_body_raw(r#"{"name":"Acme"}"#, "application/json"),
    )
    .await;

    let err = fetcher(FetchSettings::default())
        .fetch(&format!("{}/api", server.uri()))
        .await
        .unwrap_err();
    match err {
        FetchError::NotHtml { content_type, .. } => assert_eq!(content_type, "application/json"),
        other => panic!("expected NotHtml, got {other}"),
    }
}

#[tokio::test]
async fn redirects_are_followed_and_recorded() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    serve(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
    )
    .await;
    serve(
        &server,
        "/new",
        ResponseTemplate::new(200).set_body_raw("<title>Moved Co</title>", "text/html"),
    )
    .await;

    let doc = fetcher(FetchSettings::default())
        .fetch(&format!("{}/old", server.uri()))
        .await
        .expect("redirect followed");

    assert_eq!(doc.requested_url.path(), "/old");
    assert_eq!(doc.final_url.path(), "/new");
    assert_eq!(doc.title, "Moved Co");
}

#[tokio::test]
async fn shift_jis_page_is_redecoded_from_meta_charset() {
    common::init_test_tracing();
    let html = r#"<html><head><meta charset="shift_jis"><title>株式会社サンプル</title></head>
        <body><div class="content">日本語の本文です。</div></body></html>"#;
    let (bytes, _, _) = SHIFT_JIS.encode(html);

    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        ResponseTemplate::new(200).set_body_raw(bytes.into_owned(), "text/html"),
    )
    .await;

    let doc = fetcher(FetchSettings::default())
        .fetch(&format!("{}/", server.uri()))
        .await
        .expect("fetch ok");

    assert_eq!(doc.declared_charset, None);
    assert_eq!(doc.charset.source, CharsetSource::MetaCharset);
    assert_eq!(doc.charset.label, "shift_jis");
    assert!(doc.charset.redecoded);
    assert_eq!(doc.title, "株式会社サンプル");
    assert_eq!(doc.content, "日本語の本文です。");
}

#[tokio::test]
async fn oversized_bodies_are_capped() {
    common::init_test_tracing();
    let mut html = String::from("<html><head><title>Big</title></head><body><p>");
    html.push_str(&"x".repeat(10_000));
    html.push_str("</p></body></html>");

    let server = MockServer::start().await;
    serve(&server, "/", ResponseTemplate::new(200).set_body_raw(html, "text/html")).await;

    let settings = FetchSettings {
        max_body_bytes: 2_048,
        ..Default::default()
    };
    let doc = fetcher(settings)
        .fetch(&format!("{}/", server.uri()))
        .await
        .expect("fetch ok");

    assert_eq!(doc.raw_bytes.len(), 2_048);
    assert_eq!(doc.title, "Big");
}
