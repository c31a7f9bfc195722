mod activity;
mod config;
mod errors;
mod llm_client;
mod models;
mod pages;
mod routes;
mod settings;
mod state;
mod suggestion;
mod tokens;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::activity::ActivityLog;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pages::PageStore;
use crate::routes::build_router;
use crate::settings::SettingsStore;
use crate::state::AppState;
use crate::suggestion::pipeline::SuggestionEngine;
use crate::tokens::{FileTokenStore, MemoryTokenStore, SecretStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Form Fill API v{}", env!("CARGO_PKG_VERSION"));

    let tokens: Arc<dyn SecretStore> = match &config.token_store_path {
        Some(path) => {
            info!("Provider keys stored at {}", path.display());
            Arc::new(FileTokenStore::new(path))
        }
        None => {
            warn!("TOKEN_STORE_PATH is empty; provider keys will not survive a restart");
            Arc::new(MemoryTokenStore::new())
        }
    };

    let activity = Arc::new(ActivityLog::new());

    let llm = LlmClient::new(config.providers.clone(), config.llm_timeout)
        .context("Failed to build HTTP client")?;
    info!("LLM client initialized (default provider: {})", config.default_provider);

    let engine = SuggestionEngine::new(
        llm,
        tokens.clone(),
        activity.clone(),
        Some(config.default_provider.clone()),
    );

    let state = AppState {
        engine,
        tokens,
        pages: Arc::new(PageStore::new()),
        settings: Arc::new(SettingsStore::new()),
        activity,
        config: config.clone(),
    };

    // The popup runs on a chrome-extension:// origin.
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
