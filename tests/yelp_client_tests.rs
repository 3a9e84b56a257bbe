mod common;

use common::{PagedUpstream, SEARCH_PATH, business_json, page_requests, yelp_config};
use findit::clients::{RetryPolicy, YelpClient};
use findit::models::{SearchParams, SortOrder};
use serde_json::json;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn client_for(server: &MockServer) -> YelpClient {
    YelpClient::new(reqwest::Client::new(), &yelp_config(&server.uri()))
}

fn params(limit: u32, max_results: u32) -> SearchParams {
    SearchParams::new("pizza", "Boston", SortOrder::BestMatch, limit, max_results)
}

#[tokio::test]
async fn test_paginates_until_max_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(PagedUpstream { total: 500 })
        .mount(&server)
        .await;

    let results = client_for(&server).fetch(&params(50, 120)).await;

    assert_eq!(results.len(), 120);
    assert_eq!(results[0].id, "biz-0");
    assert_eq!(results[119].id, "biz-119");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        page_requests(&requests),
        vec![(0, 50), (50, 50), (100, 20)]
    );
}

#[tokio::test]
async fn test_stops_on_empty_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(PagedUpstream { total: 30 })
        .mount(&server)
        .await;

    let results = client_for(&server).fetch(&params(20, 100)).await;

    assert_eq!(results.len(), 30);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(page_requests(&requests), vec![(0, 20), (20, 20), (30, 20)]);
}

#[tokio::test]
async fn test_sends_query_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("authorization", "Bearer test-key"))
        .and(query_param("term", "pizza"))
        .and(query_param("location", "Boston"))
        .and(query_param("sort_by", "rating"))
        .respond_with(PagedUpstream { total: 3 })
        .expect(2)
        .mount(&server)
        .await;

    let params = SearchParams::new("pizza", "Boston", SortOrder::Rating, 10, 10);
    let results = client_for(&server).fetch(&params).await;

    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn test_error_status_returns_partial_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("offset", "0"))
        .respond_with(PagedUpstream { total: 100 })
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let results = client_for(&server).fetch(&params(10, 50)).await;

    assert_eq!(results.len(), 10);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_body_returns_partial_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "businesses": [business_json(0), business_json(1)] })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let results = client_for(&server).fetch(&params(2, 10)).await;

    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(PagedUpstream { total: 15 })
        .mount(&server)
        .await;

    let results = client_for(&server).fetch(&params(10, 15)).await;

    assert_eq!(results.len(), 15);
    let requests = server.received_requests().await.unwrap();
    // Two rate-limited attempts at offset 0, then both pages.
    assert_eq!(
        page_requests(&requests),
        vec![(0, 10), (0, 10), (0, 10), (10, 5)]
    );
}

#[tokio::test]
async fn test_rate_limit_budget_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let client = client_for(&server).with_retry_policy(RetryPolicy::new(
        3,
        Duration::from_millis(1),
        Duration::from_millis(2),
    ));
    let results = client.fetch(&params(10, 50)).await;

    assert!(results.is_empty());
}

#[tokio::test]
async fn test_max_results_clamped_to_upstream_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(PagedUpstream { total: 2000 })
        .mount(&server)
        .await;

    let results = client_for(&server).fetch(&params(50, 5000)).await;

    assert_eq!(results.len(), 1000);
    assert_eq!(server.received_requests().await.unwrap().len(), 20);
}

#[tokio::test]
async fn test_unreachable_upstream_returns_empty() {
    let server = MockServer::start().await;
    let config = yelp_config(&server.uri());
    drop(server);

    let client = YelpClient::new(reqwest::Client::new(), &config);
    let results = client.fetch(&params(10, 20)).await;

    assert!(results.is_empty());
}
