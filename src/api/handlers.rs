//! Request handlers for the generation routes

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::HERO_IMAGE_KEY;
use crate::error::{AppError, Result};
use crate::provider::GenerationRequest;
use crate::response::{DiffusionImageResponse, StockImageResponse};
use crate::AppState;

/// Parameters of the diffusion route
#[derive(Debug, Default, Deserialize)]
pub struct ImageParams {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Parameters of the stock route
#[derive(Debug, Default, Deserialize)]
pub struct StockImageParams {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub num_images: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub providers: ProviderAvailability,
}

#[derive(Debug, Serialize)]
pub struct ProviderAvailability {
    pub diffusion: bool,
    pub stock: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        providers: ProviderAvailability {
            diffusion: state.diffusion.is_some(),
            stock: state.stock.is_some(),
        },
    })
}

pub async fn generate_image_query(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<ImageParams>, QueryRejection>,
) -> Result<Json<DiffusionImageResponse>> {
    let Query(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    generate_image(&state, params).await.map(Json)
}

pub async fn generate_image_json(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Json<ImageParams>, JsonRejection>,
) -> Result<Json<DiffusionImageResponse>> {
    let Json(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    generate_image(&state, params).await.map(Json)
}

pub async fn generate_stock_image_query(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<StockImageParams>, QueryRejection>,
) -> Result<Json<StockImageResponse>> {
    let Query(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    generate_stock_image(&state, params).await.map(Json)
}

pub async fn generate_stock_image_json(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Json<StockImageParams>, JsonRejection>,
) -> Result<Json<StockImageResponse>> {
    let Json(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    generate_stock_image(&state, params).await.map(Json)
}

/// Without a prompt the default hero image is served from the cache
async fn generate_image(state: &AppState, params: ImageParams) -> Result<DiffusionImageResponse> {
    let prompt = params.prompt.filter(|p| !p.trim().is_empty());

    let Some(prompt) = prompt else {
        if let Some(image_url) = state.cache.get(HERO_IMAGE_KEY) {
            debug!("Serving cached hero image");
            return Ok(DiffusionImageResponse::from_data_url(image_url));
        }

        let request = GenerationRequest::new(state.settings.providers.diffusion.default_prompt.as_str())?;
        let response = run_diffusion(state, &request).await?;
        state.cache.set(HERO_IMAGE_KEY, &response.image_url);
        return Ok(response);
    };

    let request = GenerationRequest::new(prompt)?;
    run_diffusion(state, &request).await
}

async fn run_diffusion(state: &AppState, request: &GenerationRequest) -> Result<DiffusionImageResponse> {
    let client = state.diffusion()?;
    let cancel = state.request_token();

    let bytes = client.generate(request, &cancel).await?;
    info!(size = bytes.len(), "Generated diffusion image");
    Ok(DiffusionImageResponse::from_bytes(&bytes))
}

async fn generate_stock_image(state: &AppState, params: StockImageParams) -> Result<StockImageResponse> {
    let request = GenerationRequest::new(params.prompt.unwrap_or_default())?
        .with_style(params.style)
        .with_num_images(params.num_images)?;

    let client = state.stock()?;
    let cancel = state.request_token();

    let generation = client.generate(&request, &cancel).await?;
    info!(
        requested = request.image_count(),
        returned = generation.images.len(),
        request_id = generation.request_id.as_deref().unwrap_or("-"),
        "Generated stock images"
    );

    Ok(StockImageResponse::from_generation(generation, request.image_count()))
}
