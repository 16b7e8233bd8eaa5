//! Simulated incremental reveal of complete responses.
//!
//! The provider answers with the whole text at once. The engine splits it
//! into word groups and appends one group per tick to the pending message,
//! then finalizes the message with the exact original text.
//!
//! Each running reveal is one entry in a map keyed by message id, owning the
//! handle of its tick task. Entries are removed on completion or stop, and a
//! tick only mutates the conversation while its entry is still present.

mod loader;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::conversation::{ConversationError, MessageId, SharedConversation};
use crate::messaging::{ChatEvent, EventSender};

pub use loader::{Loader, LoaderConfig, LoaderHandle, LOADER_FRAMES};

/// Default number of words per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 2;
/// Default delay between chunks.
pub const DEFAULT_WORD_DELAY: Duration = Duration::from_millis(40);

/// Pacing of a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealConfig {
    /// Words per chunk. Zero is treated as one.
    pub chunk_size: usize,
    /// Delay between ticks.
    pub word_delay: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            word_delay: DEFAULT_WORD_DELAY,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevealError {
    #[error("A reveal is already running for message {0}")]
    AlreadyRevealing(MessageId),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

/// Split text on whitespace into groups of `chunk_size` words.
///
/// Every chunk carries a trailing space so chunks concatenate into readable
/// text. The last chunk may hold fewer words.
pub fn chunk_words(text: &str, chunk_size: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_size.max(1))
        .map(|group| {
            let mut chunk = group.join(" ");
            chunk.push(' ');
            chunk
        })
        .collect()
}

/// Progress of a running reveal, as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSnapshot {
    pub id: MessageId,
    /// Chunks emitted so far
    pub cursor: usize,
    pub total: usize,
}

struct ActiveReveal {
    generation: u64,
    cursor: usize,
    total: usize,
    task: Option<JoinHandle<()>>,
}

/// Drives reveals into a shared conversation.
#[derive(Clone)]
pub struct RevealEngine {
    conversation: SharedConversation,
    config: RevealConfig,
    reveals: Arc<Mutex<HashMap<MessageId, ActiveReveal>>>,
    generations: Arc<AtomicU64>,
    events: Option<EventSender>,
}

impl RevealEngine {
    pub fn new(conversation: SharedConversation, config: RevealConfig) -> Self {
        Self {
            conversation,
            config,
            reveals: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
            events: None,
        }
    }

    /// Publish chunk, completion and stop events on `sender`.
    pub fn with_sender(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> RevealConfig {
        self.config
    }

    pub fn conversation(&self) -> &SharedConversation {
        &self.conversation
    }

    /// Start revealing `full_text` into message `id` with the engine's pacing.
    pub async fn start_reveal(&self, id: MessageId, full_text: &str) -> Result<(), RevealError> {
        let RevealConfig {
            chunk_size,
            word_delay,
        } = self.config;
        self.start_reveal_with(id, full_text, chunk_size, word_delay)
            .await
    }

    /// Start revealing with explicit pacing.
    ///
    /// Returns as soon as the reveal is scheduled. A completed message is
    /// reopened first, which is the regenerate path. Text without words
    /// completes immediately.
    pub async fn start_reveal_with(
        &self,
        id: MessageId,
        full_text: &str,
        chunk_size: usize,
        word_delay: Duration,
    ) -> Result<(), RevealError> {
        let mut reveals = self.reveals.lock().await;
        if reveals.contains_key(&id) {
            return Err(RevealError::AlreadyRevealing(id));
        }

        let chunks = chunk_words(full_text, chunk_size);
        {
            let mut conversation = self.conversation.lock().await;
            let completed = conversation
                .get(id)
                .map(|m| m.completed)
                .ok_or(ConversationError::UnknownMessage(id))?;
            if completed {
                conversation.begin_regenerate(id)?;
            } else {
                conversation.set_placeholder(id, "")?;
            }

            if chunks.is_empty() {
                conversation.mark_completed(id, full_text)?;
                tracing::debug!(%id, "empty reveal completed immediately");
                self.publish(ChatEvent::Completed {
                    id,
                    content: full_text.to_string(),
                });
                return Ok(());
            }
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let total = chunks.len();
        tracing::debug!(%id, chunks = total, ?word_delay, "starting reveal");
        self.publish(ChatEvent::RevealStarted { id, chunks: total });

        let task = tokio::spawn(run_reveal(
            self.clone(),
            id,
            generation,
            chunks,
            full_text.to_string(),
            word_delay,
        ));
        reveals.insert(
            id,
            ActiveReveal {
                generation,
                cursor: 0,
                total,
                task: Some(task),
            },
        );
        Ok(())
    }

    /// Stop the reveal of `id`, keeping whatever content was already shown.
    ///
    /// Returns false when nothing was revealing. After this returns the
    /// message content is no longer touched by the stopped reveal.
    pub async fn stop_reveal(&self, id: MessageId) -> bool {
        let mut reveals = self.reveals.lock().await;
        let Some(mut active) = reveals.remove(&id) else {
            return false;
        };
        if let Some(task) = active.task.take() {
            task.abort();
        }

        let content = self
            .conversation
            .lock()
            .await
            .get(id)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        tracing::debug!(%id, cursor = active.cursor, total = active.total, "reveal stopped");
        self.publish(ChatEvent::Stopped { id, content });
        true
    }

    pub async fn is_revealing(&self, id: MessageId) -> bool {
        self.reveals.lock().await.contains_key(&id)
    }

    /// Whether any reveal is running.
    pub async fn is_streaming(&self) -> bool {
        !self.reveals.lock().await.is_empty()
    }

    pub async fn snapshot(&self, id: MessageId) -> Option<RevealSnapshot> {
        self.reveals
            .lock()
            .await
            .get(&id)
            .map(|active| RevealSnapshot {
                id,
                cursor: active.cursor,
                total: active.total,
            })
    }

    fn publish(&self, event: ChatEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

async fn run_reveal(
    engine: RevealEngine,
    id: MessageId,
    generation: u64,
    chunks: Vec<String>,
    full_text: String,
    word_delay: Duration,
) {
    // interval panics on a zero period
    let period = word_delay.max(Duration::from_millis(1));
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let mut reveals = engine.reveals.lock().await;
        let Some(active) = reveals.get_mut(&id) else {
            return;
        };
        if active.generation != generation {
            return;
        }

        let mut conversation = engine.conversation.lock().await;
        if let Some(chunk) = chunks.get(active.cursor) {
            if let Err(e) = conversation.append_content(id, chunk) {
                tracing::warn!(%id, error = %e, "abandoning reveal");
                reveals.remove(&id);
                return;
            }
            active.cursor += 1;
            engine.publish(ChatEvent::Chunk {
                id,
                text: chunk.clone(),
            });
        } else {
            let result = conversation.mark_completed(id, &full_text);
            reveals.remove(&id);
            match result {
                Ok(()) => {
                    tracing::debug!(%id, "reveal completed");
                    engine.publish(ChatEvent::Completed {
                        id,
                        content: full_text,
                    });
                }
                Err(e) => tracing::warn!(%id, error = %e, "failed to finalize reveal"),
            }
            return;
        }
    }
}
