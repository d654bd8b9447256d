#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Context;
use echochat_server::{api::AppState, config::ServerConfig, logging, router};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    logging::init(config.log_format);

    tracing::info!(
        chunk_delay_ms = config.chunk_delay.as_millis() as u64,
        max_message_chars = config.max_message_chars,
        "Starting EchoChat server"
    );

    let shutdown = CancellationToken::new();
    let app = router(AppState::new(&config, shutdown.clone()));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("EchoChat running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("EchoChat server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested, closing in-flight streams");
    shutdown.cancel();
}
