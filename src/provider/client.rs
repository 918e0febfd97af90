//! HTTP client binding one provider to the shared retry driver

use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::provider::traits::{GenerationRequest, ImageProvider};
use crate::retry::{RawResponse, RetryDriver};

/// Retrying client for a single image provider
pub struct ProviderClient<P: ImageProvider> {
    client: Client,
    provider: P,
    driver: RetryDriver,
}

impl<P: ImageProvider> ProviderClient<P> {
    /// Create a client with its own connection pool and request timeout
    pub fn new(provider: P, driver: RetryDriver, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, provider, driver))
    }

    /// Create a client sharing an existing connection pool
    pub fn with_client(client: Client, provider: P, driver: RetryDriver) -> Self {
        Self {
            client,
            provider,
            driver,
        }
    }

    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    /// Generate images, retrying transient provider failures
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<P::Output> {
        let provider = &self.provider;
        let client = &self.client;

        self.driver
            .run(
                provider.name(),
                cancel,
                |attempt| {
                    let builder = provider.build_request(client, request);
                    async move {
                        debug!(provider = %provider.name(), attempt, "Sending generation request");
                        let response = builder.send().await?;
                        let status = response.status().as_u16();
                        let body = response.bytes().await?;
                        Ok(RawResponse { status, body })
                    }
                },
                |response| provider.classify(response),
            )
            .await
    }
}
