//! Retry module - backoff policy, cancellable delay, and the shared retry driver

pub mod backoff;
pub mod delay;
pub mod driver;

pub use backoff::BackoffPolicy;
pub use delay::{Delay, TokioDelay};
pub use driver::{AttemptOutcome, AttemptState, RawResponse, RetryDriver, DEFAULT_MAX_LOADING_WAIT};
