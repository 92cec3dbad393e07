mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use corpid_common::{ExtractSettings, FetchSettings};
use corpid_extract::{
    CompanyExtractor, CompanyPipeline, ExtractFailure, ExtractResult, ExtractionMethod, FixedClock,
    Strategy,
};
use corpid_http::{FetchError, HtmlFetcher};
use encoding_rs::SHIFT_JIS;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pipeline(settings: FetchSettings) -> CompanyPipeline {
    let fetcher = HtmlFetcher::new(settings).expect("build fetcher");
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    let extractor = CompanyExtractor::new(ExtractSettings::default()).with_clock(clock);
    CompanyPipeline::new(Arc::new(fetcher), extractor)
}

#[tokio::test]
async fn shift_jis_title_end_to_end() {
    common::init_test_tracing();
    let html = r#"<html><head><meta charset="shift_jis"><title>株式会社テスト</title></head>
        <body><h1>ようこそ</h1><p>テストは精密機器を製造しています。</p></body></html>"#;
    let (bytes, _, unmappable) = SHIFT_JIS.encode(html);
    assert!(!unmappable);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(bytes.into_owned(), "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/", server.uri());
    let result = pipeline(FetchSettings::default()).run(&url).await;

    let data = result.data().expect("success");
    assert_eq!(data.name, "テスト株式会社");
    assert_eq!(data.extraction_source.method, ExtractionMethod::Title);
    assert_eq!(data.extraction_source.strategy, Strategy::Title);
    assert_eq!(result.confidence(), Strategy::Title.confidence());
    assert_eq!(data.original_url, url);
    assert_eq!(data.top_page_url, server.uri());
    assert_eq!(
        data.business_description.as_deref(),
        Some("テストは精密機器を製造しています。")
    );
}

#[tokio::test]
async fn og_site_name_used_when_title_is_boilerplate() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>会社概要</title>
               <meta property="og:site_name" content="サンプル工業株式会社">
               <meta name="description" content="サンプル工業の会社概要です。"></head></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let result = pipeline(FetchSettings::default())
        .run(&format!("{}/company/", server.uri()))
        .await;

    let data = result.data().expect("success");
    assert_eq!(data.name, "サンプル工業株式会社");
    assert_eq!(data.extraction_source.method, ExtractionMethod::Meta);
    assert_eq!(result.confidence(), 0.85);
    assert_eq!(data.meta_title, "会社概要");
    assert_eq!(data.meta_description.as_deref(), Some("サンプル工業の会社概要です。"));
}

#[tokio::test]
async fn timeout_is_reported_as_fetch_failure() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<title>Too Late Inc</title>", "text/html")
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        timeout_ms: 100,
        ..Default::default()
    };
    let result = pipeline(settings).run(&server.uri()).await;

    assert!(!result.is_success());
    assert_eq!(result.confidence(), 0.0);
    match result {
        ExtractResult::Failure {
            reason: ExtractFailure::Fetch(err @ FetchError::Timeout { .. }),
            ..
        } => assert!(err.is_retryable()),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn page_without_name_on_ip_host_fails() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>Home</title></head><body><h1>Welcome</h1></body></html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let result = pipeline(FetchSettings::default()).run(&server.uri()).await;
    assert!(matches!(
        result,
        ExtractResult::Failure {
            reason: ExtractFailure::NoCompanyNameFound { .. },
            ..
        }
    ));
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["confidence"], 0.0);
    assert!(json.get("data").is_none());
}
