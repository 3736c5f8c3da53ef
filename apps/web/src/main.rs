mod config;
mod dashboard;
mod errors;
mod export;
mod generation;
mod llm_client;
mod models;
mod notifications;
mod routes;
mod session;
mod state;
mod store;
mod views;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::session::SupabaseAuth;
use crate::state::AppState;
use crate::store::SupabaseStore;

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

    info!("Starting ResumeAI web v{}", env!("CARGO_PKG_VERSION"));

    // Hosted auth and document store share one project
    let auth = Arc::new(SupabaseAuth::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    ));
    let store = Arc::new(SupabaseStore::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    ));
    info!("Supabase clients initialized ({})", config.supabase_url);

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let state = AppState {
        auth,
        store,
        generator: Arc::new(llm),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the deployment host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
