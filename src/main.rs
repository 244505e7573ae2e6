use anyhow::Context;
use tracing_subscriber::EnvFilter;

use livestream_api::config::AppConfig;
use livestream_api::state::AppState;
use livestream_api::{build_router, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let addr = config.bind_address();

    let app_state = AppState::new(config)
        .await
        .context("Failed to initialize services")?;
    tracing::info!("✅ Vote store and match feed initialized");

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    tracing::info!("🚀 Server starting on {}", addr);

    serve(listener, app).await.context("Server error")?;
    Ok(())
}
