//! Event bus between the chat core and its renderers.

use super::ChatEvent;
use crate::conversation::MessageId;
use tokio::sync::broadcast;

/// Sender half of the event bus.
#[derive(Clone)]
pub struct EventSender {
    tx: broadcast::Sender<ChatEvent>,
}

impl EventSender {
    /// Send an event.
    pub fn send(&self, event: ChatEvent) -> Result<(), BusError> {
        self.tx.send(event).map_err(|_| BusError::Closed)?;
        Ok(())
    }

    /// Send an event, ignoring whether anyone is listening.
    pub fn publish(&self, event: ChatEvent) {
        let _ = self.send(event);
    }
}

/// Receiver half of the event bus.
pub struct EventReceiver {
    rx: broadcast::Receiver<ChatEvent>,
}

impl EventReceiver {
    /// Receive the next event.
    pub async fn recv(&mut self) -> Result<ChatEvent, BusError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => BusError::Closed,
            broadcast::error::RecvError::Lagged(n) => BusError::Lagged(n),
        })
    }

    /// Try to receive an event without waiting.
    pub fn try_recv(&mut self) -> Result<Option<ChatEvent>, BusError> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(BusError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(BusError::Lagged(n)),
        }
    }

    /// Wait until the response `id` reaches a terminal event and return it.
    ///
    /// Lagging is tolerated; intermediate events may be skipped.
    pub async fn wait_terminal(&mut self, id: MessageId) -> Result<ChatEvent, BusError> {
        loop {
            match self.recv().await {
                Ok(event) if event.is_terminal() && event.message_id() == Some(id) => {
                    return Ok(event)
                }
                Ok(_) => {}
                Err(BusError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "event receiver lagged");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Broadcast bus for chat events.
pub struct EventBus {
    tx: broadcast::Sender<ChatEvent>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Get a sender.
    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus errors.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Channel closed")]
    Closed,
    #[error("Lagged behind by {0} events")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::NoticeLevel;

    #[test]
    fn test_sender_is_clone() {
        let bus = EventBus::new();
        let sender1 = bus.sender();
        let sender2 = sender1.clone();

        let mut receiver = bus.subscribe();
        sender1.publish(ChatEvent::info("from sender1"));
        sender2.publish(ChatEvent::info("from sender2"));

        assert!(receiver.try_recv().unwrap().is_some());
        assert!(receiver.try_recv().unwrap().is_some());
        assert!(receiver.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let sender = bus.sender();

        let mut receiver1 = bus.subscribe();
        let mut receiver2 = bus.subscribe();

        sender.publish(ChatEvent::warning("broadcast"));

        assert!(receiver1.try_recv().unwrap().is_some());
        assert!(receiver2.try_recv().unwrap().is_some());
    }

    #[test]
    fn test_send_without_subscribers_is_closed() {
        let bus = EventBus::new();
        let sender = bus.sender();

        let result = sender.send(ChatEvent::info("nobody listening"));
        assert!(matches!(result, Err(BusError::Closed)));

        // publish swallows the same condition
        sender.publish(ChatEvent::info("still fine"));
    }

    #[test]
    fn test_error_notice_level() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.subscribe();

        sender.publish(ChatEvent::error("boom"));

        match receiver.try_recv().unwrap().unwrap() {
            ChatEvent::Notice(notice) => {
                assert_eq!(notice.text, "boom");
                assert_eq!(notice.level, NoticeLevel::Error);
            }
            other => panic!("Expected Notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_terminal_skips_other_messages() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.subscribe();
        let id = MessageId::new();
        let other = MessageId::new();

        sender.publish(ChatEvent::Chunk { id, text: "a ".into() });
        sender.publish(ChatEvent::Completed { id: other, content: "x".into() });
        sender.publish(ChatEvent::Completed { id, content: "a".into() });

        let event = receiver.wait_terminal(id).await.unwrap();
        assert_eq!(event, ChatEvent::Completed { id, content: "a".into() });
    }

    #[tokio::test]
    async fn test_sender_from_different_task() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let mut receiver = bus.subscribe();

        let handle = tokio::spawn(async move {
            sender.publish(ChatEvent::info("from spawned task"));
        });
        handle.await.unwrap();

        match receiver.recv().await.unwrap() {
            ChatEvent::Notice(notice) => assert_eq!(notice.text, "from spawned task"),
            other => panic!("Expected Notice, got {:?}", other),
        }
    }
}
