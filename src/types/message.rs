//! Message types for chat history

use serde::{Deserialize, Serialize};

/// Role of a message participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Any role the provider does not accept as a conversation turn
    /// (e.g. stored "event" rows). Never forwarded.
    #[serde(other)]
    Other,
}

/// A single turn of chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Whether this turn may be forwarded to the provider: a user or
    /// assistant turn with non-empty content.
    pub fn is_forwardable(&self) -> bool {
        matches!(self.role, Role::User | Role::Assistant) && !self.content.is_empty()
    }
}
