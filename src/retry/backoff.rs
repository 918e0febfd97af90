//! Capped exponential backoff

use std::time::Duration;

use crate::config::RetryConfig;

/// Computes `min(2^attempt * base_unit, cap)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_unit: Duration,
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_unit: Duration::from_millis(1000),
            cap: Duration::from_millis(10000),
        }
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            base_unit: Duration::from_millis(config.base_delay_ms),
            cap: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_unit: Duration, cap: Duration) -> Self {
        Self { base_unit, cap }
    }

    /// Wait before the attempt following `attempt` (1-based).
    ///
    /// Attempt 0 never comes out of the driver and is treated as attempt 1.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);

        self.base_unit
            .checked_mul(factor)
            .map_or(self.cap, |delay| delay.min(self.cap))
    }
}
