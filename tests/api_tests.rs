mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{PagedUpstream, SEARCH_PATH, test_config};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

struct TestApp {
    router: Router,
    server: MockServer,
    _dir: TempDir,
}

async fn spawn_app() -> TestApp {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let config = test_config(&server.uri(), dir.path());

    let state = findit::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");

    TestApp {
        router: findit::api::router(state),
        server,
        _dir: dir,
    }
}

async fn mount_upstream(server: &MockServer, total: usize) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(PagedUpstream { total })
        .mount(server)
        .await;
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri).await
}

#[tokio::test]
async fn test_welcome_and_health() {
    let app = spawn_app().await;

    let (status, body) = get(&app.router, "/api").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Welcome"));

    let (status, body) = get(&app.router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn test_search_returns_businesses_and_caches() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(PagedUpstream { total: 100 })
        .expect(3)
        .mount(&app.server)
        .await;

    let uri = "/api/search?term=pizza&location=Boston&limit=10&max_results=25";

    let (status, body) = get(&app.router, uri).await;
    assert_eq!(status, StatusCode::OK);
    let businesses = body["businesses"].as_array().unwrap();
    assert_eq!(businesses.len(), 25);
    assert_eq!(businesses[0]["id"], "biz-0");
    assert_eq!(businesses[0]["location"]["city"], "Boston");
    assert_eq!(businesses[0]["categories"][0]["alias"], "pizza");

    let (status, body) = get(&app.router, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["businesses"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_search_validation() {
    let app = spawn_app().await;

    let (status, body) = get(&app.router, "/api/search?location=Boston").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("term"));

    let (status, _) = get(&app.router, "/api/search?term=pizza&location=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(
        &app.router,
        "/api/search?term=pizza&location=Boston&sort_by=newest",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sort order"));

    let (status, _) = get(&app.router, "/api/search?term=pizza&location=Boston&limit=51").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_clamps_max_results() {
    let app = spawn_app().await;
    mount_upstream(&app.server, 2000).await;

    let (status, body) = get(
        &app.router,
        "/api/search?term=pizza&location=Boston&limit=50&max_results=5000",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["businesses"].as_array().unwrap().len(), 1000);
}

#[tokio::test]
async fn test_search_without_results_is_not_found() {
    let app = spawn_app().await;
    mount_upstream(&app.server, 0).await;

    let (status, body) = get(&app.router, "/api/search?term=unicorns&location=Boston").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No businesses found");
}

#[tokio::test]
async fn test_search_upstream_failure_is_not_found() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.server)
        .await;

    let (status, _) = get(&app.router, "/api/search?term=pizza&location=Boston").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_after_search() {
    let app = spawn_app().await;
    mount_upstream(&app.server, 100).await;

    let (status, _) = get(
        &app.router,
        "/api/search?term=pizza&location=Boston&max_results=25",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(
        &app.router,
        "/api/export?term=pizza&location=Boston&sort_by=best_match",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "CSV export successful");

    let file = body["file"].as_str().unwrap();
    let content = std::fs::read_to_string(file).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().starts_with("id,name,alias,rating"));
    assert_eq!(lines.count(), 25);

    let (status, body) = get(&app.router, "/api/export?max_results=5").await;
    assert_eq!(status, StatusCode::OK);
    let content = std::fs::read_to_string(body["file"].as_str().unwrap()).unwrap();
    assert_eq!(content.lines().count(), 6);
}

#[tokio::test]
async fn test_export_errors() {
    let app = spawn_app().await;

    let (status, body) = get(&app.router, "/api/export").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No businesses found to export");

    let (status, _) = get(&app.router, "/api/export?term=pizza&location=Boston").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(&app.router, "/api/export?term=pizza").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("together"));
}

#[tokio::test]
async fn test_clear_cache() {
    let app = spawn_app().await;
    mount_upstream(&app.server, 5).await;

    let (status, _) = get(&app.router, "/api/search?term=pizza&location=Boston").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app.router, "DELETE", "/api/cache").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cache cleared");

    let (status, _) = get(&app.router, "/api/export").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_disabled() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("not enabled"));
}

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let app = spawn_app().await;

    let (status, body) = get(&app.router, "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_serves_ui() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("/api/search"));
}

#[tokio::test]
async fn test_malformed_numbers_use_error_envelope() {
    let app = spawn_app().await;

    for uri in [
        "/api/search?term=pizza&location=Boston&limit=ten",
        "/api/search?term=pizza&location=Boston&max_results=-1",
        "/api/export?max_results=lots",
    ] {
        let (status, body) = get(&app.router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{uri}");
    }

    assert!(app.server.received_requests().await.unwrap().is_empty());
}
