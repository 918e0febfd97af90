//! Main entry point for the synthesizer marketplace image gateway

use std::sync::Arc;
use synth_image_gateway::{
    api,
    config::{ProviderSecrets, Settings},
    AppState,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let json = settings.logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer().pretty()))
        .init();

    info!("Starting synthesizer marketplace image gateway");
    info!(
        "Loaded configuration: server={}:{}",
        settings.server.host, settings.server.port
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let secrets = ProviderSecrets::from_env();
    let app_state = Arc::new(AppState::new(settings, secrets)?);
    let shutdown = app_state.shutdown.clone();

    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, cancelling in-flight retry loops
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
    shutdown.cancel();
}
