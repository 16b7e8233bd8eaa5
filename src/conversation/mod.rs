//! Conversation state management
//!
//! Holds the ordered message log and derives display sections from it.
//! The log is mutated in place: the reveal engine appends chunks to the
//! pending response and the loader writes placeholder dots into it.

mod message;
mod sections;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

pub use message::{ChatMessage, MessageId, MessageRole};
pub use sections::{partition, starts_section, MessageSection};

/// Conversation shared between the session, the reveal engine and the loader.
pub type SharedConversation = Arc<Mutex<Conversation>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Unknown message: {0}")]
    UnknownMessage(MessageId),
    #[error("Invalid state for message {id}: {reason}")]
    InvalidState { id: MessageId, reason: &'static str },
}

/// An ordered log of chat messages
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a new, empty conversation for sharing across tasks.
    pub fn shared() -> SharedConversation {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Append a message at the end of the log.
    ///
    /// Every user message after the first is flagged as a section boundary.
    pub fn append(&mut self, mut message: ChatMessage) -> MessageId {
        if !self.messages.is_empty() && message.is_user() {
            message.section_boundary = true;
        }
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn append_user(&mut self, content: impl Into<String>) -> MessageId {
        self.append(ChatMessage::user(content))
    }

    pub fn append_pending_system(&mut self) -> MessageId {
        self.append(ChatMessage::pending_system())
    }

    /// Current sections, recomputed from the log.
    pub fn partition(&self) -> Vec<MessageSection<'_>> {
        partition(&self.messages)
    }

    /// The most recently created section, if any.
    pub fn active_section(&self) -> Option<MessageSection<'_>> {
        self.partition().into_iter().rev().find(|s| s.is_active)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MessageId) -> Result<&mut ChatMessage, ConversationError> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(ConversationError::UnknownMessage(id))
    }

    /// Finalize a message with its full text.
    ///
    /// Calling twice with the same text is a no-op. Writing different text to
    /// a completed message is rejected; use [`Conversation::begin_regenerate`]
    /// first.
    pub fn mark_completed(&mut self, id: MessageId, final_text: &str) -> Result<(), ConversationError> {
        let msg = self.get_mut(id)?;
        if msg.completed {
            if msg.content == final_text {
                return Ok(());
            }
            return Err(ConversationError::InvalidState {
                id,
                reason: "already completed with different content",
            });
        }
        msg.content.clear();
        msg.content.push_str(final_text);
        msg.completed = true;
        Ok(())
    }

    /// Append revealed text to a pending message.
    pub fn append_content(&mut self, id: MessageId, chunk: &str) -> Result<(), ConversationError> {
        let msg = self.get_mut(id)?;
        if msg.completed {
            return Err(ConversationError::InvalidState {
                id,
                reason: "cannot append to a completed message",
            });
        }
        msg.content.push_str(chunk);
        Ok(())
    }

    /// Replace the content of a pending message with loader text.
    pub fn set_placeholder(&mut self, id: MessageId, text: &str) -> Result<(), ConversationError> {
        let msg = self.get_mut(id)?;
        if msg.completed {
            return Err(ConversationError::InvalidState {
                id,
                reason: "cannot show a placeholder on a completed message",
            });
        }
        msg.content.clear();
        msg.content.push_str(text);
        Ok(())
    }

    /// Reopen a response so a new answer can be written into it.
    pub fn begin_regenerate(&mut self, id: MessageId) -> Result<(), ConversationError> {
        let msg = self.get_mut(id)?;
        if !msg.is_system() {
            return Err(ConversationError::InvalidState {
                id,
                reason: "only responses can be regenerated",
            });
        }
        msg.content.clear();
        msg.completed = false;
        msg.upvoted = false;
        msg.downvoted = false;
        Ok(())
    }

    /// Toggle the upvote on a message, clearing any downvote. Returns the new upvote state.
    pub fn toggle_upvote(&mut self, id: MessageId) -> Result<bool, ConversationError> {
        let msg = self.get_mut(id)?;
        msg.upvoted = !msg.upvoted;
        msg.downvoted = false;
        Ok(msg.upvoted)
    }

    /// Toggle the downvote on a message, clearing any upvote. Returns the new downvote state.
    pub fn toggle_downvote(&mut self, id: MessageId) -> Result<bool, ConversationError> {
        let msg = self.get_mut(id)?;
        msg.downvoted = !msg.downvoted;
        msg.upvoted = false;
        Ok(msg.downvoted)
    }

    /// The user prompt that a response answers (nearest preceding user message).
    pub fn prompt_for(&self, id: MessageId) -> Option<&str> {
        let pos = self.messages.iter().position(|m| m.id == id)?;
        self.messages[..pos]
            .iter()
            .rev()
            .find(|m| m.is_user())
            .map(|m| m.content.as_str())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
