pub mod chat;
pub mod send;

use anyhow::Result;
use echochat_core::{ChatConsumer, HttpTransport};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;

/// Build a consumer talking to the configured server.
pub fn connect(settings: &Settings) -> Result<ChatConsumer<HttpTransport>> {
    let transport = HttpTransport::new(settings.server_url.clone())?;
    let consumer = ChatConsumer::new(transport);
    Ok(match settings.chunk_timeout {
        Some(timeout) => consumer.with_chunk_timeout(timeout),
        None => consumer,
    })
}

/// Cancel `token` on Ctrl-C. Abort the returned handle once the request ends.
pub fn cancel_on_ctrl_c(token: &CancellationToken) -> tokio::task::JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Ctrl-C received, cancelling request");
            token.cancel();
        }
    })
}
