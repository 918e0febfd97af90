//! Response module - adapts provider results into route payloads

pub mod base64;

use serde::Serialize;

use crate::provider::{StockGeneration, StockImage};

/// Media type used for raw diffusion output
pub const DIFFUSION_IMAGE_FORMAT: &str = "jpeg";

/// Media type assumed when a stock payload's format cannot be sniffed
pub const DEFAULT_STOCK_IMAGE_FORMAT: &str = "png";

/// Body of the diffusion route
#[derive(Debug, Clone, Serialize)]
pub struct DiffusionImageResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

impl DiffusionImageResponse {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            image_url: base64::create_data_url(bytes, DIFFUSION_IMAGE_FORMAT),
        }
    }

    pub fn from_data_url(image_url: String) -> Self {
        Self { image_url }
    }
}

/// One image inside a batch response
#[derive(Debug, Clone, Serialize)]
pub struct StockImageEntry {
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    pub seed: Option<i64>,
}

impl From<StockImage> for StockImageEntry {
    fn from(image: StockImage) -> Self {
        let format = base64::sniff_format(&image.base64).unwrap_or(DEFAULT_STOCK_IMAGE_FORMAT);
        Self {
            image_url: base64::wrap_data_url(&image.base64, format),
            seed: image.seed,
        }
    }
}

/// Body of the stock route.
///
/// Callers asking for one image get the flat shape, callers asking for more
/// get the batch shape.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StockImageResponse {
    Single {
        #[serde(rename = "imageUrl")]
        image_url: String,
        seed: Option<i64>,
        request_id: Option<String>,
    },
    Batch {
        images: Vec<StockImageEntry>,
        request_id: Option<String>,
        count: usize,
    },
}

impl StockImageResponse {
    /// Select the response shape from the number of images the caller requested
    pub fn from_generation(generation: StockGeneration, requested: u32) -> Self {
        let request_id = generation.request_id;
        let mut entries: Vec<StockImageEntry> = generation
            .images
            .into_iter()
            .map(StockImageEntry::from)
            .collect();

        if requested > 1 || entries.len() != 1 {
            let count = entries.len();
            return Self::Batch {
                images: entries,
                request_id,
                count,
            };
        }

        let entry = entries.remove(0);
        Self::Single {
            image_url: entry.image_url,
            seed: entry.seed,
            request_id,
        }
    }
}
