use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spbe_lib::{document_tasks, HttpFetcher, ReferenceDataRun, RunConfig, RunError};

const LISTING_PATH: &str = "/listing/securities/list/";

fn test_config(server: &MockServer) -> RunConfig {
    RunConfig {
        base_url: server.uri(),
        inter_page_delay_ms: 0,
        request_timeout_secs: 5,
        ..RunConfig::default()
    }
}

fn listing_body() -> String {
    r#"{"pageData":{"content":[
        {"srtsCode":"RK0001","sisinCode":"RU000A0JX0J2","fullName":"ООО Рога и Копыта","securityKind":"Облигации","slevelName":"Некотировальная часть Списка"},
        {"srtsCode":"AKC001","sisinCode":"RU000A0SHARE","fullName":"АО Акция","securityKind":"Акции"},
        {"srtsCode":"PK0002","sisinCode":"RU000A0JX0K0","fullName":"АО Пример Капитал","securityKind":"Облигации"}
    ],"totalPages":1,"totalElements":3,"number":0}}"#
        .to_string()
}

fn detail_body(isin: &str) -> String {
    format!(
        r#"<html><body>
        <a href="/files/{isin}/prospekt.pdf">Проспект</a>
        <script>self.__next_f.push([1,"5:{{\"pageData\":{{\"sisinCode\":\"{isin}\",\"scouponRate\":\"9,5% годовых\",\"searlyRedemption\":\"Не предусмотрена\",\"smaturityDate\":\"2027-06-20T00:00:00Z\"}}}}"])</script>
        </body></html>"#
    )
}

#[tokio::test]
async fn collects_enriches_and_normalizes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body()))
        .mount(&server)
        .await;
    for (code, isin) in [("RK0001", "RU000A0JX0J2"), ("PK0002", "RU000A0JX0K0")] {
        Mock::given(method("GET"))
            .and(path(format!("/listing/securities/{}/", code)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_body(isin)))
            .mount(&server)
            .await;
    }

    let cfg = test_config(&server);
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let harvest = ReferenceDataRun::new(&cfg).collect(&fetcher).await.unwrap();

    // the share is filtered out, both bonds survive
    assert_eq!(harvest.bonds.len(), 2);
    assert_eq!(harvest.detail_failures, 0);
    assert_eq!(harvest.dropped, 0);

    let first = &harvest.bonds[0].record;
    assert_eq!(first.isin(), "RU000A0JX0J2");
    // listing field kept, detail fields merged and normalized
    assert_eq!(first.get("Listing Section"), Some("Некотировальная часть Списка"));
    assert_eq!(first.get("Coupon"), Some("9,5% годовых"));
    assert_eq!(first.get("Early Redemption Option"), Some("No"));
    assert_eq!(first.get("Maturity Date"), Some("2027-06-20"));

    // each bond found its prospectus link
    assert_eq!(harvest.bonds[0].documents.len(), 1);
    let tasks = document_tasks(&harvest.bonds, std::path::Path::new("/tmp/p"));
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].filename, "prospekt.pdf");
}

#[tokio::test]
async fn detail_failure_degrades_to_listing_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing/securities/RK0001/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_body("RU000A0JX0J2")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listing/securities/PK0002/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cfg = test_config(&server);
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let harvest = ReferenceDataRun::new(&cfg).collect(&fetcher).await.unwrap();

    assert_eq!(harvest.bonds.len(), 2);
    assert_eq!(harvest.detail_failures, 1);

    let degraded = &harvest.bonds[1].record;
    assert_eq!(degraded.isin(), "RU000A0JX0K0");
    assert_eq!(degraded.get("Coupon"), Some(""));
    assert!(harvest.bonds[1].documents.is_empty());
}

#[tokio::test]
async fn run_with_no_extractable_records_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let cfg = test_config(&server);
    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let result = ReferenceDataRun::new(&cfg).collect(&fetcher).await;

    assert!(matches!(result, Err(RunError::NoRecords)));
}
