use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use ai_agent_server::config::Settings;
use ai_agent_server::logging::init_logger;
use ai_agent_server::router::build_router;
use ai_agent_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging (guard flushes the file writer on drop)
    let _log_guard = init_logger(&settings.logging)?;

    info!("🚀 Starting AI agent relay...");
    info!("✅ Configuration loaded");

    if settings.llm.api_key.is_empty() {
        warn!("No LLM API key configured, every reply will be the fallback message");
    }
    if !settings.persistence_enabled() {
        warn!("No backend API key configured, conversations will not be persisted");
    }
    if settings.messaging.is_configured() {
        info!(
            "Messaging account configured (number: {})",
            settings.messaging.phone_number.as_deref().unwrap_or("-")
        );
    }

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let state = Arc::new(AppState::from_settings(settings));
    let app = build_router(state);

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
