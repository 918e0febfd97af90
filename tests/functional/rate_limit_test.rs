//! Functional tests for rate limiting

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use synth_image_gateway::middleware::rate_limit::RateLimitLayer;
use tower::ServiceExt;

fn create_test_app(rps: u32, burst: u32) -> Router {
    Router::new()
        .route("/health", axum::routing::get(|| async { "healthy" }))
        .route("/api/generate-image", axum::routing::get(|| async { "OK" }))
        .layer(RateLimitLayer::new(rps, burst))
}

fn request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_rate_limit_allows_within_limit() {
    let app = create_test_app(100, 100);

    let response = app.oneshot(request("/api/generate-image")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_health_bypass() {
    let app = create_test_app(1, 1);

    // Exhaust the single-token bucket, then health must still answer
    let _ = app.clone().oneshot(request("/api/generate-image")).await.unwrap();
    for _ in 0..5 {
        let response = app.clone().oneshot(request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rate_limit_exceeded_returns_error_object() {
    let app = create_test_app(1, 1);

    let response = app.clone().oneshot(request("/api/generate-image")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut limited = None;
    for _ in 0..10 {
        let response = app.clone().oneshot(request("/api/generate-image")).await.unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            limited = Some(response);
            break;
        }
    }

    let response = limited.expect("Expected rate limiting to kick in");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Rate limit exceeded"));
}

#[tokio::test]
async fn test_rate_limit_burst_capacity() {
    let app = create_test_app(1, 5);

    for _ in 0..5 {
        let response = app.clone().oneshot(request("/api/generate-image")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
