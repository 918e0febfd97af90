//! Cooperative, cancellable delay between retry attempts

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};

/// Suspends the calling task without blocking the runtime
#[async_trait]
pub trait Delay: Send + Sync {
    /// Sleep for `duration`, returning `AppError::Cancelled` if `cancel` fires first
    async fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<()>;
}

/// Delay backed by the tokio timer; honours paused time in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> Result<()> {
        tokio::select! {
            _ = cancel.cancelled() => Err(AppError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
