//! Error types for chat streaming

use std::time::Duration;

use thiserror::Error;

/// Chat streaming error types
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("No chunk received within {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    /// Status code an HTTP surface should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ChatError::InvalidInput(_) => 400,
            ChatError::Server { status, .. } => *status,
            ChatError::Timeout(_) => 504,
            _ => 500,
        }
    }
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;
