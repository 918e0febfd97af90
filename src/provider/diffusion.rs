//! Diffusion model provider returning raw image bytes

use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use crate::config::DiffusionConfig;
use crate::provider::traits::{classify_failure, GenerationRequest, ImageProvider};
use crate::retry::{AttemptOutcome, RawResponse};

/// Generation parameters sent with every diffusion request
#[derive(Debug, Clone, Serialize)]
pub struct DiffusionParameters {
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
}

impl From<&DiffusionConfig> for DiffusionParameters {
    fn from(config: &DiffusionConfig) -> Self {
        Self {
            negative_prompt: config.negative_prompt.clone(),
            width: config.width,
            height: config.height,
            num_inference_steps: config.num_inference_steps,
            guidance_scale: config.guidance_scale,
        }
    }
}

#[derive(Debug, Serialize)]
struct DiffusionPayload<'a> {
    inputs: &'a str,
    parameters: &'a DiffusionParameters,
}

/// Hosted diffusion inference endpoint, authenticated with a bearer token
pub struct DiffusionProvider {
    endpoint: String,
    api_key: String,
    parameters: DiffusionParameters,
}

impl DiffusionProvider {
    pub fn new(config: &DiffusionConfig, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key.into(),
            parameters: DiffusionParameters::from(config),
        }
    }
}

impl ImageProvider for DiffusionProvider {
    type Output = Bytes;

    fn name(&self) -> &'static str {
        "diffusion"
    }

    fn build_request(&self, client: &Client, request: &GenerationRequest) -> RequestBuilder {
        client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&DiffusionPayload {
                inputs: &request.prompt,
                parameters: &self.parameters,
            })
    }

    fn classify(&self, response: RawResponse) -> AttemptOutcome<Bytes> {
        if !response.is_success() {
            return classify_failure(self.name(), &response, &[]);
        }

        if response.body.is_empty() {
            return AttemptOutcome::Malformed("diffusion provider returned an empty image".to_string());
        }

        AttemptOutcome::Success(response.body)
    }
}
