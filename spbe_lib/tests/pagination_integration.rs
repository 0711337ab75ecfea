use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spbe_lib::{HttpFetcher, Paginator};

/// Builds a listing page body in the shape the site server-renders.
fn listing_body(page: u32, total_pages: u32, total_elements: u64, count: usize) -> String {
    let records: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"srtsCode":"B{page:02}{i:03}","sisinCode":"RU000A{page:02}{i:04}","fullName":"Эмитент {page}-{i}","securityKind":"Облигации"}}"#
            )
        })
        .collect();
    format!(
        r#"{{"pageData":{{"content":[{}],"totalPages":{},"totalElements":{},"number":{}}}}}"#,
        records.join(","),
        total_pages,
        total_elements,
        page
    )
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(5)).unwrap()
}

fn paginator() -> Paginator {
    Paginator::new(Duration::ZERO, 200)
}

#[tokio::test]
async fn merges_pages_and_stops_at_total_elements() {
    let server = MockServer::start().await;

    // page sizes [10, 10, 5] with totalElements 25: the aggregator must stop
    // after page 3 even though the envelope claims a fourth page exists
    for (page, count) in [(0u32, 10usize), (1, 10), (2, 5)] {
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_body(page, 4, 25, count)),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(3, 4, 25, 5)))
        .expect(0)
        .mount(&server)
        .await;

    let set = paginator()
        .collect(&fetcher(), |page| {
            format!("{}/list?page={}", server.uri(), page)
        })
        .await;

    assert_eq!(set.records.len(), 25);
    assert!(set.failures.is_empty());
    assert_eq!(set.expected_total, Some(25));
    assert!(!set.is_incomplete());
}

#[tokio::test]
async fn failed_page_is_skipped_not_fatal() {
    let server = MockServer::start().await;

    for page in [0u32, 1, 3, 4] {
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("page", page.to_string()))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(listing_body(page, 5, 50, 10)),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let set = paginator()
        .collect(&fetcher(), |page| {
            format!("{}/list?page={}", server.uri(), page)
        })
        .await;

    // pages 1, 2, 4, 5 contribute; page 3 is a recorded failure
    assert_eq!(set.records.len(), 40);
    assert_eq!(set.failures.len(), 1);
    assert_eq!(set.failures[0].page, 3);
    assert!(set.is_incomplete());
}

#[tokio::test]
async fn single_page_without_envelope_is_complete() {
    let server = MockServer::start().await;

    let body = r#"{"content":[{"sisinCode":"RU000A0JX0J2","securityKind":"Облигации"}]}"#;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(0)
        .mount(&server)
        .await;

    let set = paginator()
        .collect(&fetcher(), |page| {
            format!("{}/list?page={}", server.uri(), page)
        })
        .await;

    assert_eq!(set.records.len(), 1);
    assert_eq!(set.expected_total, None);
}

#[tokio::test]
async fn unextractable_page_is_a_recorded_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Access denied</html>"))
        .mount(&server)
        .await;

    let set = paginator()
        .collect(&fetcher(), |page| {
            format!("{}/list?page={}", server.uri(), page)
        })
        .await;

    assert!(set.records.is_empty());
    assert_eq!(set.failures.len(), 1);
}
