//! Provider module - request builders, response classification, and the retrying client

pub mod client;
pub mod diffusion;
pub mod stock;
pub mod traits;

pub use client::ProviderClient;
pub use diffusion::DiffusionProvider;
pub use stock::{StockGeneration, StockImage, StockProvider};
pub use traits::{classify_failure, GenerationRequest, ImageProvider};
