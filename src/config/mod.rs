//! Configuration module - settings loading, validation, and provider secrets

pub mod secrets;
pub mod settings;

pub use secrets::{ProviderSecrets, DIFFUSION_API_KEY, STOCK_API_KEY};
pub use settings::*;
