//! arena-shell server entry point.
//!
//! Starts the Axum HTTP server and, when `SOCKET_URL` is set, opens the
//! shell's socket connection.

use tracing_subscriber::EnvFilter;

use arena_shell::app::build_app;
use arena_shell::app_state::AppState;
use arena_shell::config::ShellConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ShellConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        environment = %config.environment,
        "starting arena-shell"
    );

    let socket_url = config.socket_url.clone();
    let state = AppState::from_config(config.clone())?;
    tracing::info!(rule = %state.proxy.rule(), "api proxy configured");

    if let Some(url) = socket_url {
        state.store.connect(&url).await?;
    }

    let store = std::sync::Arc::clone(&state.store);
    let app = build_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.disconnect().await;
    if let Some(handle) = store.current().await {
        handle.closed().await;
    }
    tracing::info!("arena-shell stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
