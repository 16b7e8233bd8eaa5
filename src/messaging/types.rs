//! Event types published while a conversation runs.

use serde::{Deserialize, Serialize};

use crate::conversation::MessageId;

/// Message levels for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A free-form status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Events flowing from the session and reveal engine to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A prompt was accepted and a response slot was opened.
    Submitted {
        prompt_id: MessageId,
        response_id: MessageId,
        prompt: String,
    },
    /// Loader placeholder text changed.
    Placeholder { id: MessageId, text: String },
    /// The provider answered and the reveal is about to begin.
    RevealStarted { id: MessageId, chunks: usize },
    /// One chunk of words was appended to the response.
    Chunk { id: MessageId, text: String },
    /// The response is final.
    Completed { id: MessageId, content: String },
    /// The reveal or request was stopped; content is whatever was shown so far.
    Stopped { id: MessageId, content: String },
    /// The provider failed; the response was finalized with `fallback`.
    Failed {
        id: MessageId,
        reason: String,
        fallback: String,
    },
    Notice(Notice),
}

impl ChatEvent {
    pub fn info(text: impl Into<String>) -> Self {
        Self::Notice(Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        })
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::Notice(Notice {
            level: NoticeLevel::Success,
            text: text.into(),
        })
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::Notice(Notice {
            level: NoticeLevel::Warning,
            text: text.into(),
        })
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Notice(Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        })
    }

    /// Response message this event belongs to, if any.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            ChatEvent::Submitted { response_id, .. } => Some(*response_id),
            ChatEvent::Placeholder { id, .. }
            | ChatEvent::RevealStarted { id, .. }
            | ChatEvent::Chunk { id, .. }
            | ChatEvent::Completed { id, .. }
            | ChatEvent::Stopped { id, .. }
            | ChatEvent::Failed { id, .. } => Some(*id),
            ChatEvent::Notice(_) => None,
        }
    }

    /// Whether this event ends the lifecycle of a response.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChatEvent::Completed { .. } | ChatEvent::Stopped { .. } | ChatEvent::Failed { .. }
        )
    }
}
