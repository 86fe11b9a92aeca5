use std::net::SocketAddr;

use anyhow::Context;
use cli::ElectionRoll;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vote_service::{build_router, config::Config, cors_layer, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        "Starting Ballot Ledger Vote Service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let roll = ElectionRoll::read(&config.election_path).with_context(|| {
        format!(
            "Failed to load election roll (set ELECTION_PATH, currently {})",
            config.election_path.display()
        )
    })?;

    // Open the ledger and replay it before accepting requests
    let app_state = AppState::initialize(&config, roll).await?;

    let cors = cors_layer(config.cors_allow_origin.as_deref())?;
    let app = build_router(app_state, cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
