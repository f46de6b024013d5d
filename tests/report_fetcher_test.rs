// ==========================================
// HttpReportFetcher 集成测试
// ==========================================
// 测试目标: 地址布局 / 404 视为未发布 / 非 2xx 报错 / 超时
// ==========================================


use reactor_status_ts::config::FetchConfig;
use reactor_status_ts::importer::{FetchOutcome, HttpReportFetcher, IngestError, ReportFetcher};
use std::time::Duration;
use test_helpers::{two_field_report, ymd};
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetch_config(server: &MockServer) -> FetchConfig {
    FetchConfig {
        base_url: format!("{}/reactor-status", server.uri()),
        timeout_secs: 1,
        ..FetchConfig::default()
    }
}

#[tokio::test]
async fn test_fetches_document_by_date_path() {
    let server = MockServer::start().await;
    let body = two_field_report(&[("GINNA", "100")]);
    Mock::given(method("GET"))
        .and(path("/reactor-status/2021/20210107ps.html"))
        .and(header_regex("user-agent", "^reactor-status-ts/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpReportFetcher::new(&fetch_config(&server)).unwrap();
    let outcome = fetcher.fetch(ymd(2021, 1, 7)).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Document(body));
}

#[tokio::test]
async fn test_not_found_is_not_published() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpReportFetcher::new(&fetch_config(&server)).unwrap();
    let outcome = fetcher.fetch(ymd(2021, 1, 7)).await.unwrap();

    assert_eq!(outcome, FetchOutcome::NotPublished);
}

#[tokio::test]
async fn test_server_error_is_http_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpReportFetcher::new(&fetch_config(&server)).unwrap();
    let err = fetcher.fetch(ymd(2021, 1, 7)).await.unwrap_err();

    assert!(matches!(err, IngestError::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let fetcher = HttpReportFetcher::new(&fetch_config(&server)).unwrap();
    let err = fetcher.fetch(ymd(2021, 1, 7)).await.unwrap_err();

    assert!(matches!(err, IngestError::FetchTimeout { .. }));
}
