//! Functional tests for provider clients against a mock HTTP provider

use serde_json::json;
use std::time::Duration;
use synth_image_gateway::config::{DiffusionConfig, StockConfig};
use synth_image_gateway::provider::{
    DiffusionProvider, GenerationRequest, ProviderClient, StockProvider,
};
use synth_image_gateway::retry::{BackoffPolicy, RetryDriver};
use synth_image_gateway::AppError;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

fn fast_driver() -> RetryDriver {
    RetryDriver::new(
        BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(5)),
        5,
    )
}

fn diffusion_client(server: &MockServer) -> ProviderClient<DiffusionProvider> {
    let config = DiffusionConfig {
        endpoint: format!("{}/models/sdxl", server.uri()),
        ..DiffusionConfig::default()
    };
    ProviderClient::new(
        DiffusionProvider::new(&config, "hf_test"),
        fast_driver(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn stock_client(server: &MockServer) -> ProviderClient<StockProvider> {
    let config = StockConfig {
        endpoint: format!("{}/v1/ai/text-to-image", server.uri()),
        ..StockConfig::default()
    };
    ProviderClient::new(
        StockProvider::new(&config, "fp_test"),
        fast_driver(),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_diffusion_sends_bearer_and_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/sdxl"))
        .and(header("authorization", "Bearer hf_test"))
        .and(body_json(json!({
            "inputs": "eurorack case full of modules",
            "parameters": {
                "negative_prompt": "blurry, low quality, distorted, watermark, text",
                "width": 1024,
                "height": 768,
                "num_inference_steps": 30,
                "guidance_scale": 7.5
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let client = diffusion_client(&server);
    let request = GenerationRequest::new("eurorack case full of modules").unwrap();
    let bytes = client
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(&bytes[..], JPEG);
}

#[tokio::test]
async fn test_diffusion_waits_for_model_to_load() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": "Model stabilityai/stable-diffusion-xl-base-1.0 is currently loading",
            "estimated_time": 0.01
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG.to_vec()))
        .mount(&server)
        .await;

    let client = diffusion_client(&server);
    let request = GenerationRequest::new("tb-303").unwrap();
    let bytes = client
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(&bytes[..], JPEG);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_diffusion_server_errors_exhaust_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(5)
        .mount(&server)
        .await;

    let client = diffusion_client(&server);
    let request = GenerationRequest::new("dx7").unwrap();
    let err = client
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RetriesExhausted { attempts: 5, .. }));
    assert_eq!(err.provider_status(), Some(500));
}

#[tokio::test]
async fn test_stock_sends_api_key_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/ai/text-to-image"))
        .and(header("x-freepik-api-key", "fp_test"))
        .and(body_json(json!({
            "prompt": "modular synth",
            "style": "photographic",
            "num_images": 2,
            "image": { "size": "square_1_1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "base64": "iVBORw0KGgo=", "seed": 11, "has_nsfw": false },
                { "base64": "iVBORw0KGgo=", "seed": 12, "has_nsfw": false }
            ],
            "meta": { "request_id": "abc-123", "image": { "size": "square_1_1" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = stock_client(&server);
    let request = GenerationRequest::new("modular synth")
        .unwrap()
        .with_num_images(Some(2))
        .unwrap();
    let generation = client
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(generation.images.len(), 2);
    assert_eq!(generation.images[1].seed, Some(12));
    assert_eq!(generation.request_id.as_deref(), Some("abc-123"));
}

#[tokio::test]
async fn test_stock_quota_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "message": "Payment required: free quota exhausted"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = stock_client(&server);
    let request = GenerationRequest::new("polysix").unwrap();
    let err = client
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::QuotaExceeded { status: 402, .. }));
}

#[tokio::test]
async fn test_stock_rate_limit_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({ "message": "Too Many Requests" })))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "base64": "iVBORw0KGgo=", "seed": 5 }],
            "meta": { "request_id": "retry-ok" }
        })))
        .mount(&server)
        .await;

    let client = stock_client(&server);
    let request = GenerationRequest::new("sh-101").unwrap();
    let generation = client
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(generation.request_id.as_deref(), Some("retry-ok"));
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_unreachable_provider_is_retried_then_reported() {
    // Bind and drop a listener so its port refuses connections
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let config = DiffusionConfig {
        endpoint: format!("{}/models/sdxl", uri),
        ..DiffusionConfig::default()
    };
    let driver = RetryDriver::new(
        BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(2)),
        3,
    );
    let client = ProviderClient::new(
        DiffusionProvider::new(&config, "hf_test"),
        driver,
        Duration::from_secs(2),
    )
    .unwrap();

    let request = GenerationRequest::new("ms-20").unwrap();
    let err = client
        .generate(&request, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        AppError::RetriesExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, AppError::HttpClient(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
