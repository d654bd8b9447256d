use crate::config::ServerConfig;
use echochat_core::EchoEmitter;
use tokio_util::sync::CancellationToken;

/// Application state shared across all API handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub emitter: EchoEmitter,
    pub max_message_chars: usize,
    /// Cancelled on shutdown; every reply stream holds a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: &ServerConfig, shutdown: CancellationToken) -> Self {
        Self {
            emitter: EchoEmitter::new(config.chunk_delay),
            max_message_chars: config.max_message_chars,
            shutdown,
        }
    }
}
