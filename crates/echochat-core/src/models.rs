//! Chat models shared by the emitter, consumer and HTTP surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ChatError, Result};

/// Role of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Single chat message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    role: ChatRole,
    content: String,
    timestamp: i64,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Creation time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Append-only, ordered conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    id: Uuid,
    messages: Vec<Message>,
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatHistory {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Finalized assistant replies, in the order they completed.
    pub fn replies(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|message| message.role == ChatRole::Assistant)
    }
}

/// Request payload for `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Parse a raw JSON body, rejecting payloads without a string `message`.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ChatError::InvalidInput(format!("body is not valid JSON: {}", e)))?;

        match value.get("message") {
            Some(serde_json::Value::String(message)) => Ok(Self::new(message.clone())),
            Some(other) => Err(ChatError::InvalidInput(format!(
                "field 'message' must be a string, got {}",
                json_type_name(other)
            ))),
            None => Err(ChatError::InvalidInput(
                "missing field 'message'".to_string(),
            )),
        }
    }

    /// Enforce the character limit. A limit of 0 disables the check.
    pub fn validate(&self, max_chars: usize) -> Result<()> {
        if max_chars == 0 {
            return Ok(());
        }
        let chars = self.message.chars().count();
        if chars > max_chars {
            return Err(ChatError::InvalidInput(format!(
                "message has {} characters, limit is {}",
                chars, max_chars
            )));
        }
        Ok(())
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_append_only_and_ordered() {
        let mut history = ChatHistory::new();
        assert!(history.is_empty());

        history.push(Message::user("hi"));
        history.push(Message::assistant("hi"));
        history.push(Message::user("yo"));

        assert_eq!(history.len(), 3);
        let contents: Vec<_> = history.messages().iter().map(Message::content).collect();
        assert_eq!(contents, vec!["hi", "hi", "yo"]);
        assert_eq!(history.last().map(Message::role), Some(ChatRole::User));
        assert_eq!(history.replies().count(), 1);
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("x")).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
    }

    #[test]
    fn request_parses_message_field() {
        let request = ChatRequest::from_json(br#"{"message":"hello"}"#).unwrap();
        assert_eq!(request.message, "hello");
    }

    #[test]
    fn request_rejects_missing_or_non_string_message() {
        let missing = ChatRequest::from_json(br#"{"text":"hello"}"#).unwrap_err();
        assert!(matches!(missing, ChatError::InvalidInput(ref m) if m.contains("missing")));

        let number = ChatRequest::from_json(br#"{"message":42}"#).unwrap_err();
        assert!(matches!(number, ChatError::InvalidInput(ref m) if m.contains("number")));

        let garbage = ChatRequest::from_json(b"not json").unwrap_err();
        assert!(matches!(garbage, ChatError::InvalidInput(_)));
    }

    #[test]
    fn validate_counts_characters_not_bytes() {
        let request = ChatRequest::new("héé");
        assert!(request.validate(3).is_ok());
        assert!(request.validate(2).is_err());
        assert!(request.validate(0).is_ok());
    }
}
