//! codexchat Library
//!
//! Chat with hosted LLMs through a small relay server, with responses
//! revealed a few words at a time.
//!
//! ## Main Components
//!
//! - [`conversation`] - Message log and its display sections
//! - [`reveal`] - Word-by-word reveal engine and the pending-response loader
//! - [`chat`] - Session lifecycle: submit, stop, regenerate, votes
//! - [`provider`] - Completion providers (relay client, Gemini, OpenAI)
//! - [`server`] - Relay backend routes
//! - [`messaging`] - Event bus and terminal renderer
//! - [`config`] - Settings and env file loading
//! - [`cli`] - Interactive REPL and single-prompt runner
//!
//! ## Quick Start
//!
//! ```ignore
//! use codexchat::{ChatSession, EventBus, RelayClient, RelayRoute, SessionConfig};
//! use std::sync::Arc;
//!
//! let bus = EventBus::new();
//! let provider = Arc::new(RelayClient::new("http://localhost:5000", RelayRoute::Gemini));
//! let session = ChatSession::new(provider, SessionConfig::default(), bus.sender());
//! let submission = session.submit("hello").await?;
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod messaging;
pub mod provider;
pub mod reveal;
pub mod server;

// Re-export commonly used types
pub use chat::{ChatError, ChatSession, Outcome, SessionConfig, Submission};
pub use config::{ConfigError, Settings};
pub use conversation::{
    ChatMessage, Conversation, ConversationError, MessageId, MessageRole, MessageSection,
    SharedConversation,
};
pub use messaging::{ChatEvent, EventBus, EventReceiver, EventSender, TerminalRenderer};
pub use provider::{
    CompletionProvider, GeminiClient, OpenAiClient, ProviderError, RelayClient, RelayRoute,
};
pub use reveal::{chunk_words, Loader, LoaderHandle, RevealConfig, RevealEngine, RevealError};
pub use server::{Server, ServerError};
