//! Placeholder animation shown while a response is pending.
//!
//! Cycles a short dot sequence into the pending message until cancelled.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::conversation::{MessageId, SharedConversation};
use crate::messaging::{ChatEvent, EventSender};

/// Placeholder frames, repeated in order.
pub const LOADER_FRAMES: &[&str] = &["", ".", "..", "..."];

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Animation frames.
    pub frames: Vec<&'static str>,
    /// Frame duration.
    pub interval: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            frames: LOADER_FRAMES.to_vec(),
            interval: Duration::from_millis(300),
        }
    }
}

/// Handle to a running loader.
///
/// Dropping the handle stops the animation as well.
pub struct LoaderHandle {
    id: MessageId,
    conversation: SharedConversation,
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl LoaderHandle {
    /// Stop the animation.
    ///
    /// The stop flag is raised under the conversation lock and every frame is
    /// written under the same lock after checking it, so no placeholder can
    /// land once this returns.
    pub async fn cancel(mut self) {
        {
            let _conversation = self.conversation.lock().await;
            let _ = self.stop_tx.send(true);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        tracing::trace!(id = %self.id, "loader cancelled");
    }
}

impl Drop for LoaderHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawns placeholder animations.
#[derive(Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
    events: Option<EventSender>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LoaderConfig) -> Self {
        Self {
            config,
            events: None,
        }
    }

    /// Publish every frame as a placeholder event.
    pub fn with_sender(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Start animating message `id`. The first frame is written immediately.
    pub fn start(&self, conversation: SharedConversation, id: MessageId) -> LoaderHandle {
        let frames = if self.config.frames.is_empty() {
            LOADER_FRAMES.to_vec()
        } else {
            self.config.frames.clone()
        };
        let period = self.config.interval.max(Duration::from_millis(1));
        let events = self.events.clone();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let shared = conversation.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for frame in frames.iter().cycle() {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop_rx.changed() => break,
                }

                let mut conversation = shared.lock().await;
                if *stop_rx.borrow() {
                    break;
                }
                if let Err(e) = conversation.set_placeholder(id, frame) {
                    tracing::debug!(%id, error = %e, "loader stopping");
                    break;
                }
                if let Some(events) = &events {
                    events.publish(ChatEvent::Placeholder {
                        id,
                        text: frame.to_string(),
                    });
                }
            }
        });

        LoaderHandle {
            id,
            conversation,
            stop_tx,
            task: Some(task),
        }
    }
}
