use std::sync::Arc;

use cleo_chat::{config::Config, routes, state::AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cleo_chat=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(gemini = ?config.gemini, "configuration loaded");
    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; chat requests will fail");
    }

    let state = Arc::new(AppState::new(config.gemini.clone())?);
    let app = routes::create_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Cleo chat proxy listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
