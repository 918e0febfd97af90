//! Shared retry driver for provider calls
//!
//! The driver owns the attempt loop. Providers only build requests and
//! classify responses, so every provider gets the same loading, rate-limit,
//! quota and transport-error handling.

use bytes::Bytes;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::error::{AppError, Result};
use crate::retry::backoff::BackoffPolicy;
use crate::retry::delay::{Delay, TokioDelay};

/// Status and body of a provider response, read before any parsing
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// How a provider response should be handled by the driver
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    /// Usable payload; ends the loop
    Success(T),
    /// Model is warming up; wait the provider's own estimate
    Loading {
        estimated: Duration,
        status: u16,
        body: String,
    },
    /// Rate limited or server error; exponential backoff
    Transient { status: u16, body: String },
    /// Quota exhausted; never retried
    Terminal { status: u16, body: String },
    /// Any other non-success status
    Failed { status: u16, body: String },
    /// Success status with a body that could not be decoded; retried with backoff
    Malformed(String),
}

/// Bookkeeping for a single driver invocation
#[derive(Debug)]
pub struct AttemptState {
    pub attempt: u32,
    pub max_retries: u32,
    pub last_error: Option<AppError>,
    pub waited: Duration,
}

impl AttemptState {
    fn new(max_retries: u32) -> Self {
        Self {
            attempt: 0,
            max_retries,
            last_error: None,
            waited: Duration::ZERO,
        }
    }

    fn is_last(&self) -> bool {
        self.attempt >= self.max_retries
    }
}

/// Executes provider calls with loading-aware, capped exponential retry
#[derive(Clone)]
pub struct RetryDriver {
    policy: BackoffPolicy,
    max_retries: u32,
    max_loading_wait: Duration,
    delay: Arc<dyn Delay>,
}

/// Default bound on a single model-loading wait
pub const DEFAULT_MAX_LOADING_WAIT: Duration = Duration::from_secs(60);

impl RetryDriver {
    /// Create a driver sleeping on the tokio timer
    pub fn new(policy: BackoffPolicy, max_retries: u32) -> Self {
        Self {
            policy,
            max_retries: max_retries.max(1),
            max_loading_wait: DEFAULT_MAX_LOADING_WAIT,
            delay: Arc::new(TokioDelay),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(BackoffPolicy::from(config), config.max_retries)
            .with_max_loading_wait(Duration::from_millis(config.max_loading_wait_ms))
    }

    /// Bound the provider's loading estimate
    pub fn with_max_loading_wait(mut self, max_loading_wait: Duration) -> Self {
        self.max_loading_wait = max_loading_wait;
        self
    }

    /// Replace the delay primitive, e.g. with a recording one in tests
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn policy(&self) -> BackoffPolicy {
        self.policy
    }

    pub fn max_loading_wait(&self) -> Duration {
        self.max_loading_wait
    }

    /// Run `call` until `classify` yields a success or a final failure.
    ///
    /// `call` receives the 1-based attempt number. An `Err` from `call` is a
    /// transport failure and is retried with backoff like a 5xx. So is a
    /// success status whose body does not decode.
    pub async fn run<T, F, Fut, C>(
        &self,
        provider: &str,
        cancel: &CancellationToken,
        mut call: F,
        classify: C,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<RawResponse>>,
        C: Fn(RawResponse) -> AttemptOutcome<T>,
    {
        let mut state = AttemptState::new(self.max_retries);

        while state.attempt < state.max_retries {
            state.attempt += 1;
            let attempt = state.attempt;

            if cancel.is_cancelled() {
                debug!(provider = %provider, attempt, "Retry loop cancelled");
                return Err(AppError::Cancelled);
            }

            let response = match call(attempt).await {
                Ok(response) => response,
                Err(err) => {
                    warn!(provider = %provider, attempt, error = %err, "Provider call failed");
                    state.last_error = Some(err);
                    if !state.is_last() {
                        self.wait(&mut state, self.policy.delay_for(attempt), cancel)
                            .await?;
                    }
                    continue;
                }
            };

            match classify(response) {
                AttemptOutcome::Success(value) => {
                    info!(
                        provider = %provider,
                        attempts = attempt,
                        waited_ms = state.waited.as_millis() as u64,
                        "Provider call succeeded"
                    );
                    return Ok(value);
                }
                AttemptOutcome::Loading {
                    estimated,
                    status,
                    body,
                } => {
                    state.last_error = Some(AppError::Provider { status, body });
                    if state.is_last() {
                        break;
                    }
                    let wait = if estimated > self.max_loading_wait {
                        warn!(
                            provider = %provider,
                            attempt,
                            estimated_ms = estimated.as_millis() as u64,
                            cap_ms = self.max_loading_wait.as_millis() as u64,
                            "Loading estimate exceeds cap, waiting for cap instead"
                        );
                        self.max_loading_wait
                    } else {
                        estimated
                    };
                    info!(
                        provider = %provider,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "Model is loading, waiting for estimated time"
                    );
                    self.wait(&mut state, wait, cancel).await?;
                }
                AttemptOutcome::Transient { status, body } => {
                    warn!(provider = %provider, attempt, status, "Transient provider failure");
                    state.last_error = Some(AppError::Provider { status, body });
                    if state.is_last() {
                        break;
                    }
                    self.wait(&mut state, self.policy.delay_for(attempt), cancel)
                        .await?;
                }
                AttemptOutcome::Terminal { status, body } => {
                    warn!(provider = %provider, attempt, status, "Provider quota exceeded");
                    return Err(AppError::QuotaExceeded { status, body });
                }
                AttemptOutcome::Failed { status, body } => {
                    warn!(provider = %provider, attempt, status, "Provider rejected request");
                    return Err(AppError::Provider { status, body });
                }
                AttemptOutcome::Malformed(message) => {
                    warn!(provider = %provider, attempt, error = %message, "Malformed provider response");
                    state.last_error = Some(AppError::MalformedResponse(message));
                    if state.is_last() {
                        break;
                    }
                    self.wait(&mut state, self.policy.delay_for(attempt), cancel)
                        .await?;
                }
            }
        }

        let source = state
            .last_error
            .take()
            .unwrap_or_else(|| AppError::Internal("maximum retries reached".to_string()));

        warn!(
            provider = %provider,
            attempts = state.attempt,
            waited_ms = state.waited.as_millis() as u64,
            "Retries exhausted"
        );

        Err(AppError::RetriesExhausted {
            attempts: state.attempt,
            source: Box::new(source),
        })
    }

    async fn wait(
        &self,
        state: &mut AttemptState,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        debug!(
            attempt = state.attempt,
            delay_ms = duration.as_millis() as u64,
            "Waiting before next attempt"
        );
        self.delay.sleep(duration, cancel).await?;
        state.waited += duration;
        Ok(())
    }
}
