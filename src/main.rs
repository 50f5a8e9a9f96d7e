//! Server binary: read configuration, build the router, serve.

use std::sync::Arc;

use tracing::info;

use score_edit_server::config::Config;
use score_edit_server::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::from_config(&config)?);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, model = %config.llm.model, "score-edit-server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
