//! Stock image provider returning base64 encoded images

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::StockConfig;
use crate::provider::traits::{classify_failure, GenerationRequest, ImageProvider};
use crate::retry::{AttemptOutcome, RawResponse};

/// Header carrying the stock provider API key
pub const API_KEY_HEADER: &str = "x-freepik-api-key";

/// Statuses that end the retry loop at once
const TERMINAL_STATUSES: &[u16] = &[402];

#[derive(Debug, Serialize)]
struct StockPayload<'a> {
    prompt: &'a str,
    style: &'a str,
    num_images: u32,
    image: ImageSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ImageSpec<'a> {
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct StockApiResponse {
    #[serde(default)]
    data: Vec<StockImage>,
    #[serde(default)]
    meta: StockMeta,
}

#[derive(Debug, Default, Deserialize)]
struct StockMeta {
    #[serde(default)]
    request_id: Option<String>,
}

/// One generated image as returned by the provider
#[derive(Debug, Clone, Deserialize)]
pub struct StockImage {
    pub base64: String,
    #[serde(default)]
    pub seed: Option<i64>,
}

/// Decoded stock generation result
#[derive(Debug, Clone)]
pub struct StockGeneration {
    pub images: Vec<StockImage>,
    pub request_id: Option<String>,
}

/// Text-to-image stock endpoint, authenticated with an API key header
pub struct StockProvider {
    endpoint: String,
    api_key: String,
    default_style: String,
    image_size: String,
}

impl StockProvider {
    pub fn new(config: &StockConfig, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            default_style: config.default_style.clone(),
            image_size: config.image_size.clone(),
        }
    }

    fn payload<'a>(&'a self, request: &'a GenerationRequest) -> StockPayload<'a> {
        StockPayload {
            prompt: &request.prompt,
            style: request.style.as_deref().unwrap_or(&self.default_style),
            num_images: request.image_count(),
            image: ImageSpec {
                size: &self.image_size,
            },
        }
    }
}

impl ImageProvider for StockProvider {
    type Output = StockGeneration;

    fn name(&self) -> &'static str {
        "stock"
    }

    fn build_request(&self, client: &Client, request: &GenerationRequest) -> RequestBuilder {
        client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.payload(request))
    }

    fn classify(&self, response: RawResponse) -> AttemptOutcome<StockGeneration> {
        if !response.is_success() {
            return classify_failure(self.name(), &response, TERMINAL_STATUSES);
        }

        let parsed: StockApiResponse = match serde_json::from_slice(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                return AttemptOutcome::Malformed(format!(
                    "stock provider returned invalid JSON: {}",
                    e
                ))
            }
        };

        if parsed.data.is_empty() {
            return AttemptOutcome::Malformed("stock provider returned no images".to_string());
        }

        AttemptOutcome::Success(StockGeneration {
            images: parsed.data,
            request_id: parsed.meta.request_id,
        })
    }
}
