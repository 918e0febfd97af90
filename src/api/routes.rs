//! Route table for the gateway

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::handlers;
use crate::middleware::rate_limit::RateLimitLayer;
use crate::AppState;

pub const GENERATE_IMAGE_PATH: &str = "/api/generate-image";
pub const GENERATE_STOCK_IMAGE_PATH: &str = "/api/generate-stock-image";

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let rate_limit = state.settings.rate_limit.clone();

    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            GENERATE_IMAGE_PATH,
            get(handlers::generate_image_query).post(handlers::generate_image_json),
        )
        .route(
            GENERATE_STOCK_IMAGE_PATH,
            get(handlers::generate_stock_image_query).post(handlers::generate_stock_image_json),
        )
        .with_state(state);

    if rate_limit.enabled {
        router = router.layer(RateLimitLayer::new(
            rate_limit.requests_per_second,
            rate_limit.burst_size,
        ));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
