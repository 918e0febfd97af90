//! Common traits and types for image generation providers

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::retry::{AttemptOutcome, RawResponse};

/// Upper bound on images per stock generation call
pub const MAX_IMAGES_PER_REQUEST: u32 = 4;

/// Request to generate images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The prompt to generate images from
    pub prompt: String,

    /// Style tag, only understood by the stock provider
    pub style: Option<String>,

    /// Number of images to generate
    pub num_images: Option<u32>,
}

impl GenerationRequest {
    /// Build a validated request; the prompt is trimmed and must not be empty
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(AppError::InvalidRequest("Prompt is required".to_string()));
        }

        Ok(Self {
            prompt,
            style: None,
            num_images: None,
        })
    }

    pub fn with_style(mut self, style: Option<String>) -> Self {
        self.style = style
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn with_num_images(mut self, num_images: Option<u32>) -> Result<Self> {
        if let Some(n) = num_images {
            if n == 0 || n > MAX_IMAGES_PER_REQUEST {
                return Err(AppError::InvalidRequest(format!(
                    "num_images must be between 1 and {}",
                    MAX_IMAGES_PER_REQUEST
                )));
            }
        }
        self.num_images = num_images;
        Ok(self)
    }

    /// Requested image count, defaulting to one
    pub fn image_count(&self) -> u32 {
        self.num_images.unwrap_or(1)
    }
}

/// A provider-specific request builder and response classifier.
///
/// The retry loop itself lives in [`crate::retry::RetryDriver`]; a provider
/// only describes its wire format.
pub trait ImageProvider: Send + Sync {
    /// Decoded payload of a successful call
    type Output: Send;

    /// Provider name used in logs and errors
    fn name(&self) -> &'static str;

    /// Build the outbound request for one attempt
    fn build_request(&self, client: &Client, request: &GenerationRequest) -> RequestBuilder;

    /// Map a raw response onto a retry decision
    fn classify(&self, response: RawResponse) -> AttemptOutcome<Self::Output>;
}

/// Error body shape shared by the providers
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    estimated_time: Option<f64>,
}

/// Classify a non-success response.
///
/// 503 with `estimated_time` is a loading signal, 429 and 5xx are transient,
/// statuses in `terminal` fail immediately, everything else is a plain failure.
/// An unparseable error body is logged and treated by status alone.
pub fn classify_failure<T>(
    provider: &str,
    response: &RawResponse,
    terminal: &[u16],
) -> AttemptOutcome<T> {
    let status = response.status;
    let body = response.text().into_owned();

    if terminal.contains(&status) {
        return AttemptOutcome::Terminal { status, body };
    }

    if status == 503 {
        match serde_json::from_str::<ProviderErrorBody>(&body) {
            Ok(ProviderErrorBody {
                estimated_time: Some(seconds),
            }) if seconds.is_finite() && seconds >= 0.0 => {
                let estimated = Duration::from_millis((seconds * 1000.0).ceil() as u64);
                return AttemptOutcome::Loading {
                    estimated,
                    status,
                    body,
                };
            }
            Ok(_) => {}
            Err(e) => {
                warn!(provider = %provider, status, error = %e, "Could not parse provider error body");
            }
        }
    }

    if status == 429 || status >= 500 {
        AttemptOutcome::Transient { status, body }
    } else {
        AttemptOutcome::Failed { status, body }
    }
}
