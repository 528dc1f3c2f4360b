use anyhow::Context;
use clap::Args;
use std::net::SocketAddr;

use crate::app::{app, AppState};
use crate::config::AppConfig;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Bind host (overrides HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Bind port (overrides PROGRAMS_API_PORT / PORT)")]
    pub port: Option<u16>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!("Starting Programs Metadata API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("SECURITY_JWT_SECRET is not set; token authentication will fail");
    }

    let bind_addr = config.bind_addr();
    let state = AppState::from_config(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
