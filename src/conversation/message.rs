//! Chat message types
//!
//! Defines the message record held by the conversation log.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    System,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: MessageRole,
    pub content: String,
    /// Set once the response text is final
    pub completed: bool,
    /// Marks the first message of a new display section
    pub section_boundary: bool,
    pub upvoted: bool,
    pub downvoted: bool,
}

impl ChatMessage {
    /// A user-authored prompt. User messages are complete as soon as they exist.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::User,
            content: content.into(),
            completed: true,
            section_boundary: false,
            upvoted: false,
            downvoted: false,
        }
    }

    /// An empty response slot waiting for provider text.
    pub fn pending_system() -> Self {
        Self {
            id: MessageId::new(),
            role: MessageRole::System,
            content: String::new(),
            completed: false,
            section_boundary: false,
            upvoted: false,
            downvoted: false,
        }
    }

    pub fn with_section_boundary(mut self, boundary: bool) -> Self {
        self.section_boundary = boundary;
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    pub fn is_system(&self) -> bool {
        self.role == MessageRole::System
    }
}
