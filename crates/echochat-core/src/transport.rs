//! Transports carrying a chat request to an emitter and its chunks back.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::emitter::EchoEmitter;
use crate::error::{ChatError, Result};
use crate::models::ChatRequest;

/// Header used to correlate client and server logs for one request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Chunk stream handed to the consumer. Dropping it releases the underlying
/// resources (emitter task or HTTP connection).
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one request and return the stream of its response chunks.
    async fn open(&self, request: &ChatRequest, request_id: &str) -> Result<ChunkStream>;
}

/// Drives an [`EchoEmitter`] in-process.
#[derive(Debug, Clone, Default)]
pub struct LocalTransport {
    emitter: EchoEmitter,
    max_message_chars: usize,
    shutdown: CancellationToken,
}

impl LocalTransport {
    pub fn new(emitter: EchoEmitter) -> Self {
        Self {
            emitter,
            max_message_chars: 0,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_max_message_chars(mut self, max_message_chars: usize) -> Self {
        self.max_message_chars = max_message_chars;
        self
    }

    /// Token that stops every stream opened by this transport.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[async_trait]
impl ChatTransport for LocalTransport {
    async fn open(&self, request: &ChatRequest, request_id: &str) -> Result<ChunkStream> {
        request.validate(self.max_message_chars)?;
        tracing::debug!(
            request_id,
            chars = request.message.chars().count(),
            "Opening local echo stream"
        );

        let stream = self
            .emitter
            .emit(request.message.clone(), self.shutdown.child_token())
            .map(Ok::<Bytes, ChatError>);
        Ok(Box::pin(stream))
    }
}

/// Talks to an echochat server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, request: &ChatRequest, request_id: &str) -> Result<ChunkStream> {
        let response = self
            .client
            .post(self.endpoint())
            .header(REQUEST_ID_HEADER, request_id)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(body);
            tracing::warn!(request_id, status = status.as_u16(), %message, "Chat request rejected");

            if status == reqwest::StatusCode::BAD_REQUEST {
                return Err(ChatError::InvalidInput(message));
            }
            return Err(ChatError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ChatError::StreamInterrupted(e.to_string())));
        Ok(Box::pin(stream))
    }
}
