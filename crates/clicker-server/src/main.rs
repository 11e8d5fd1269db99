use clicker_server::app;
use clicker_server::config::ServerConfig;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let router = app(&config)?;
    let listener = tokio::net::TcpListener::bind(config.bind).await?;

    tracing::info!(
        bind = %listener.local_addr()?,
        data_dir = ?config.data_dir,
        player_key = %config.player_key,
        "clicker server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("clicker server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl-c handler unavailable, running until killed");
        std::future::pending::<()>().await;
    }
}
