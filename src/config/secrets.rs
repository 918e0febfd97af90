//! Provider API keys, read once at startup

use std::env;
use tracing::warn;

use crate::error::{AppError, Result};

pub const DIFFUSION_API_KEY: &str = "DIFFUSION_API_KEY";
pub const STOCK_API_KEY: &str = "STOCK_IMAGE_API_KEY";

/// API keys for the outbound providers. A missing key disables its route.
#[derive(Clone, Default)]
pub struct ProviderSecrets {
    pub diffusion: Option<String>,
    pub stock: Option<String>,
}

impl std::fmt::Debug for ProviderSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSecrets")
            .field("diffusion", &self.diffusion.as_ref().map(|_| "<redacted>"))
            .field("stock", &self.stock.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProviderSecrets {
    pub fn from_env() -> Self {
        Self {
            diffusion: read_secret(DIFFUSION_API_KEY),
            stock: read_secret(STOCK_API_KEY),
        }
    }

    pub fn diffusion(&self) -> Result<&str> {
        self.diffusion.as_deref().ok_or(AppError::MissingSecret {
            provider: "diffusion",
            variable: DIFFUSION_API_KEY,
        })
    }

    pub fn stock(&self) -> Result<&str> {
        self.stock.as_deref().ok_or(AppError::MissingSecret {
            provider: "stock",
            variable: STOCK_API_KEY,
        })
    }
}

fn read_secret(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => {
            warn!("{key} not set, the matching provider route will refuse requests");
            None
        }
    }
}
