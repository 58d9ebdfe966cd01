mod capabilities;
mod envelope;
mod error;
mod google_api;
mod local;
mod messaging;
mod pipeline;
mod routes;
mod settings;
mod state;
mod storage;
mod translate;
mod vision;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use capabilities::CapabilityFactory;
use local::LocalDispatcher;
use pipeline::Pipeline;
use settings::Settings;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("image_translate=debug,tower_http=debug")),
        )
        .init();

    let settings = Settings::load()?;
    settings.validate()?;
    info!(
        "Loaded configuration: transport={}, targets={:?}, translate_topic={}, result_topic={}, result_bucket={}",
        settings.transport,
        settings.to_lang,
        settings.translate_topic,
        settings.result_topic,
        settings.result_bucket
    );

    // Capability clients are built once and shared by every invocation
    let capabilities = CapabilityFactory::create(&settings)?;
    let pipeline = Arc::new(Pipeline::new(&settings, &capabilities));

    if let Some(broker) = capabilities.local_broker.clone() {
        LocalDispatcher::new(broker, pipeline.clone(), settings.local_max_attempts)
            .start(&settings.translate_topic, &settings.result_topic);
    }

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .context("Invalid host/port")?;
    let app_state = AppState::new(settings, pipeline);

    let app = Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
