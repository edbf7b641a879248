use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::app::app;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgRepository};
use crate::services::ViaCepClient;
use crate::state::AppState;

/// Bind and serve until Ctrl-C
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting rapseglog-api in {:?} mode", config.environment);
    if config.environment == crate::config::Environment::Production
        && config.security.cors_origins.iter().any(|o| o == "*")
    {
        warn!("CORS allows any origin in production");
    }

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    let cep = ViaCepClient::new(&config.cep)?;
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(Arc::new(PgRepository::new(pool)), Arc::new(cep), config);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("rapseglog-api listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("rapseglog-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
