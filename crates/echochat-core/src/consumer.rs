//! Consumer side of the echo stream.
//!
//! [`ChatConsumer`] owns the conversation state (history, in-flight partial
//! reply and request phase) and moves one request at a time through
//! `Idle -> Sending -> Receiving -> Finalized`. A request that fails or is
//! cancelled ends in `Aborted` instead, and leaves no reply in the history.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::decoder::Utf8Decoder;
use crate::error::{ChatError, Result};
use crate::models::{ChatHistory, ChatRequest, Message};
use crate::transport::{ChatTransport, ChunkStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerPhase {
    Idle,
    Sending,
    Receiving,
    Finalized,
    Aborted,
}

/// Progress notifications emitted while a request is consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Sending { request_id: String },
    /// Newly decoded text plus the accumulated partial reply.
    Chunk { delta: String, partial: String },
    Finalized { message: Message, chunks: usize },
}

pub struct ChatConsumer<T> {
    transport: T,
    history: ChatHistory,
    partial: Option<String>,
    phase: ConsumerPhase,
    chunk_timeout: Option<Duration>,
}

impl<T: ChatTransport> ChatConsumer<T> {
    pub fn new(transport: T) -> Self {
        Self::with_history(transport, ChatHistory::new())
    }

    pub fn with_history(transport: T, history: ChatHistory) -> Self {
        Self {
            transport,
            history,
            partial: None,
            phase: ConsumerPhase::Idle,
            chunk_timeout: None,
        }
    }

    /// Abort a request when no chunk arrives within `timeout`.
    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.chunk_timeout = Some(timeout);
        self
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn into_history(self) -> ChatHistory {
        self.history
    }

    /// Text received so far for the in-flight request.
    pub fn partial(&self) -> Option<&str> {
        self.partial.as_deref()
    }

    pub fn phase(&self) -> ConsumerPhase {
        self.phase
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `text`, stream the reply and append it to the history.
    ///
    /// The user message is recorded before the request goes out. On success
    /// the finalized reply is appended and returned; on failure or
    /// cancellation the partial reply is discarded.
    pub async fn submit<F>(
        &mut self,
        text: impl Into<String>,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> Result<Message>
    where
        F: FnMut(StreamEvent),
    {
        let text = text.into();
        let request = ChatRequest::new(text.clone());
        let request_id = Uuid::new_v4().to_string();

        self.history.push(Message::user(text));
        self.partial = None;
        self.phase = ConsumerPhase::Sending;
        tracing::debug!(%request_id, history_id = %self.history.id(), "Sending chat request");
        on_event(StreamEvent::Sending {
            request_id: request_id.clone(),
        });

        match self
            .receive(&request, &request_id, cancel, &mut on_event)
            .await
        {
            Ok((content, chunks)) => {
                let reply = Message::assistant(content);
                self.history.push(reply.clone());
                self.partial = None;
                self.phase = ConsumerPhase::Finalized;
                tracing::debug!(%request_id, chunks, "Chat reply finalized");
                on_event(StreamEvent::Finalized {
                    message: reply.clone(),
                    chunks,
                });
                Ok(reply)
            }
            Err(err) => {
                self.partial = None;
                self.phase = ConsumerPhase::Aborted;
                tracing::warn!(%request_id, error = %err, "Chat request aborted");
                Err(err)
            }
        }
    }

    async fn receive<F>(
        &mut self,
        request: &ChatRequest,
        request_id: &str,
        cancel: &CancellationToken,
        on_event: &mut F,
    ) -> Result<(String, usize)>
    where
        F: FnMut(StreamEvent),
    {
        let mut stream = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            opened = self.transport.open(request, request_id) => opened?,
        };

        self.phase = ConsumerPhase::Receiving;
        self.partial = Some(String::new());
        let mut decoder = Utf8Decoder::new();
        let mut chunks = 0usize;

        loop {
            // Dropping `stream` on early return releases the connection.
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ChatError::Cancelled),
                next = next_chunk(&mut stream, self.chunk_timeout) => next?,
            };
            let Some(chunk) = next else {
                break;
            };

            chunks += 1;
            let delta = decoder.decode(&chunk);
            self.append(delta, on_event);
        }

        let tail = decoder.finish();
        self.append(tail, on_event);

        Ok((self.partial.take().unwrap_or_default(), chunks))
    }

    fn append<F>(&mut self, delta: String, on_event: &mut F)
    where
        F: FnMut(StreamEvent),
    {
        if delta.is_empty() {
            return;
        }
        let partial = self.partial.get_or_insert_with(String::new);
        partial.push_str(&delta);
        on_event(StreamEvent::Chunk {
            delta,
            partial: partial.clone(),
        });
    }
}

async fn next_chunk(stream: &mut ChunkStream, timeout: Option<Duration>) -> Result<Option<Bytes>> {
    let next = match timeout {
        Some(limit) => tokio::time::timeout(limit, stream.next())
            .await
            .map_err(|_| ChatError::Timeout(limit))?,
        None => stream.next().await,
    };
    next.transpose()
}
