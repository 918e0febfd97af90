//! Unit tests for response adapters

use serde_json::json;
use synth_image_gateway::provider::{StockGeneration, StockImage};
use synth_image_gateway::response::{base64, DiffusionImageResponse, StockImageResponse};

const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAAB";
const JPEG_B64: &str = "/9j/4AAQSkZJRgABAQAAAQABAAD";

fn generation(images: &[(&str, i64)]) -> StockGeneration {
    StockGeneration {
        images: images
            .iter()
            .map(|(b64, seed)| StockImage {
                base64: b64.to_string(),
                seed: Some(*seed),
            })
            .collect(),
        request_id: Some("req-42".to_string()),
    }
}

#[test]
fn test_diffusion_response_is_jpeg_data_url() {
    let response = DiffusionImageResponse::from_bytes(b"Hello, World!");
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(
        json,
        json!({ "imageUrl": "data:image/jpeg;base64,SGVsbG8sIFdvcmxkIQ==" })
    );
}

#[test]
fn test_batch_response_shape() {
    let response = StockImageResponse::from_generation(
        generation(&[(PNG_B64, 1), (JPEG_B64, 2)]),
        2,
    );
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["count"], 2);
    assert_eq!(json["request_id"], "req-42");
    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(
        images[0],
        json!({ "imageUrl": format!("data:image/png;base64,{}", PNG_B64), "seed": 1 })
    );
    assert_eq!(
        images[1],
        json!({ "imageUrl": format!("data:image/jpeg;base64,{}", JPEG_B64), "seed": 2 })
    );
    assert!(json.get("imageUrl").is_none());
}

#[test]
fn test_single_response_shape() {
    let response = StockImageResponse::from_generation(generation(&[(PNG_B64, 7)]), 1);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(
        json,
        json!({
            "imageUrl": format!("data:image/png;base64,{}", PNG_B64),
            "seed": 7,
            "request_id": "req-42",
        })
    );
}

#[test]
fn test_extra_images_for_single_request_use_batch_shape() {
    let response = StockImageResponse::from_generation(
        generation(&[(PNG_B64, 1), (PNG_B64, 2)]),
        1,
    );
    assert!(matches!(response, StockImageResponse::Batch { count: 2, .. }));
}

#[test]
fn test_unknown_format_defaults_to_png() {
    let response = StockImageResponse::from_generation(generation(&[("aGVsbG8=", 3)]), 1);
    match response {
        StockImageResponse::Single { image_url, .. } => {
            assert_eq!(image_url, "data:image/png;base64,aGVsbG8=");
        }
        other => panic!("unexpected shape: {:?}", other),
    }
}

#[test]
fn test_sniff_format() {
    assert_eq!(base64::sniff_format(PNG_B64), Some("png"));
    assert_eq!(base64::sniff_format(JPEG_B64), Some("jpeg"));
    assert_eq!(base64::sniff_format("not base64 at all!!"), None);
}
