//! EchoChat core - streaming echo chat primitives
//!
//! This crate provides:
//! - The chat data model (messages, history, request payload)
//! - An emitter that turns a text into a delayed, cancellable chunk stream
//! - An incremental UTF-8 decoder for chunked byte streams
//! - A consumer that assembles chunks into finalized chat replies
//! - In-process and HTTP transports connecting the two

pub mod consumer;
pub mod decoder;
pub mod emitter;
pub mod error;
pub mod models;
pub mod transport;

// Re-export commonly used types
pub use consumer::{ChatConsumer, ConsumerPhase, StreamEvent};
pub use decoder::Utf8Decoder;
pub use emitter::{EchoEmitter, EchoStream};
pub use error::{ChatError, Result};
pub use models::{ChatHistory, ChatRequest, ChatRole, Message};
pub use transport::{ChatTransport, ChunkStream, HttpTransport, LocalTransport, REQUEST_ID_HEADER};
