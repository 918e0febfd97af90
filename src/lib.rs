//! Synthesizer Marketplace Image Gateway
//!
//! Serves listing artwork from third-party image generation providers.
//! Provider calls go through a shared retry driver that understands model
//! loading estimates, rate limits and quota exhaustion.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod provider;
pub mod response;
pub mod retry;
pub mod session;
pub mod storage;

pub use error::{AppError, Result};

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::TtlCache;
use crate::config::{ProviderSecrets, Settings, DIFFUSION_API_KEY, STOCK_API_KEY};
use crate::provider::{DiffusionProvider, ProviderClient, StockProvider};
use crate::retry::RetryDriver;
use crate::session::{SessionContext, StoredSession};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    /// `None` when the provider is disabled or its API key is missing
    pub diffusion: Option<ProviderClient<DiffusionProvider>>,
    pub stock: Option<ProviderClient<StockProvider>>,
    pub cache: TtlCache,
    /// Current marketplace user, kept in the same store as the cache
    pub session: Arc<dyn SessionContext>,
    /// Cancelled on server shutdown; every request runs under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build providers and cache from validated settings.
    ///
    /// A provider whose key is missing is left unconfigured so that its route
    /// refuses requests instead of sending unauthenticated calls.
    pub fn new(settings: Settings, secrets: ProviderSecrets) -> Result<Self> {
        settings.validate()?;
        let driver = RetryDriver::from_config(&settings.retry);

        let diffusion_config = &settings.providers.diffusion;
        let diffusion = match (diffusion_config.enabled, secrets.diffusion()) {
            (false, _) => None,
            (true, Ok(key)) => Some(ProviderClient::new(
                DiffusionProvider::new(diffusion_config, key),
                driver.clone(),
                Duration::from_millis(diffusion_config.timeout_ms),
            )?),
            (true, Err(e)) => {
                warn!(error = %e, "Diffusion route disabled");
                None
            }
        };

        let stock_config = &settings.providers.stock;
        let stock = match (stock_config.enabled, secrets.stock()) {
            (false, _) => None,
            (true, Ok(key)) => Some(ProviderClient::new(
                StockProvider::new(stock_config, key),
                driver.clone(),
                Duration::from_millis(stock_config.timeout_ms),
            )?),
            (true, Err(e)) => {
                warn!(error = %e, "Stock image route disabled");
                None
            }
        };

        let store: Arc<dyn KeyValueStore> = match &settings.cache.storage_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        let cache = TtlCache::new(store.clone(), settings.cache.ttl());
        let session: Arc<dyn SessionContext> = Arc::new(StoredSession::new(store));

        info!(
            diffusion = diffusion.is_some(),
            stock = stock.is_some(),
            max_retries = settings.retry.max_retries,
            "Initialized providers"
        );

        Ok(Self {
            settings,
            diffusion,
            stock,
            cache,
            session,
            shutdown: CancellationToken::new(),
        })
    }

    /// Replace the cache, e.g. to inject a controllable clock
    pub fn with_cache(mut self, cache: TtlCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn diffusion(&self) -> Result<&ProviderClient<DiffusionProvider>> {
        self.diffusion.as_ref().ok_or(AppError::MissingSecret {
            provider: "diffusion",
            variable: DIFFUSION_API_KEY,
        })
    }

    pub fn stock(&self) -> Result<&ProviderClient<StockProvider>> {
        self.stock.as_ref().ok_or(AppError::MissingSecret {
            provider: "stock",
            variable: STOCK_API_KEY,
        })
    }

    /// Token for one request, cancelled on shutdown.
    ///
    /// A dropped request drops the retry loop with it, so no guard is needed.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
