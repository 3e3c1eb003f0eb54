mod cache;
mod cleaner;
mod config;
mod errors;
mod extract;
mod generation;
mod llm_client;
mod models;
mod parser;
mod preview;
mod progress;
mod routes;
mod state;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::ArtifactCache;
use crate::config::Config;
use crate::llm_client::AnthropicClient;
use crate::preview::PreviewServer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume2site API v{}", env!("CARGO_PKG_VERSION"));

    // Open the artifact cache (creates directories on first run)
    let cache = ArtifactCache::open(&config.cache_dir)?;
    info!("Artifact cache at {}", config.cache_dir.display());

    // Initialize LLM client
    let model = Arc::new(AnthropicClient::new(config.anthropic_api_key.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let state = AppState {
        model,
        cache,
        preview: Arc::new(tokio::sync::Mutex::new(PreviewServer::new())),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
