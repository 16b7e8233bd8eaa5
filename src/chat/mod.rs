//! Chat session lifecycle.
//!
//! A submit appends the prompt and an empty response, animates the loader
//! while the provider works, then hands the answer to the reveal engine.
//! Only one response may be in flight at a time.

mod clipboard;
mod share;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::conversation::{Conversation, ConversationError, MessageId, SharedConversation};
use crate::messaging::{ChatEvent, EventSender};
use crate::provider::{CompletionProvider, ProviderError};
use crate::reveal::{Loader, LoaderConfig, LoaderHandle, RevealConfig, RevealEngine, RevealError};

pub use clipboard::copy_to_clipboard;
pub use share::{format_share_links, share_links, ShareLink};

/// Shown in place of a response when the provider fails.
pub const PROVIDER_FALLBACK: &str = "Sorry, I couldn't process your request at the moment.";
/// Shown in place of a response when the provider does not answer in time.
pub const TIMEOUT_MARKER: &str = "Request timed out.";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("A response is still in progress")]
    Busy,
    #[error("No prompt precedes message {0}")]
    NoPrompt(MessageId),
    #[error("Clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Reveal(#[from] RevealError),
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub reveal: RevealConfig,
    pub loader: LoaderConfig,
    pub request_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reveal: RevealConfig::default(),
            loader: LoaderConfig::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// How a request ended, from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The answer is being revealed.
    Revealing,
    /// The provider failed; the response holds the fallback text.
    Failed,
    /// The provider timed out; the response holds the timeout marker.
    TimedOut,
    /// The request was stopped before the provider answered; its result was dropped.
    Discarded,
}

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub prompt_id: MessageId,
    pub response_id: MessageId,
    pub outcome: Outcome,
}

struct Pending {
    ticket: u64,
    response_id: MessageId,
    loader: LoaderHandle,
}

#[derive(Default)]
struct SessionState {
    pending: Option<Pending>,
    /// Response most recently submitted or regenerated
    current: Option<MessageId>,
    next_ticket: u64,
}

/// A conversation wired to a provider.
#[derive(Clone)]
pub struct ChatSession {
    conversation: SharedConversation,
    provider: Arc<dyn CompletionProvider>,
    engine: RevealEngine,
    loader: Loader,
    events: EventSender,
    request_timeout: Duration,
    state: Arc<Mutex<SessionState>>,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        config: SessionConfig,
        events: EventSender,
    ) -> Self {
        let conversation = Conversation::shared();
        let engine =
            RevealEngine::new(conversation.clone(), config.reveal).with_sender(events.clone());
        let loader = Loader::with_config(config.loader).with_sender(events.clone());
        Self {
            conversation,
            provider,
            engine,
            loader,
            events,
            request_timeout: config.request_timeout,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    pub fn conversation(&self) -> &SharedConversation {
        &self.conversation
    }

    /// Whether a request or reveal is in progress. New submissions are
    /// refused while this holds.
    pub async fn is_streaming(&self) -> bool {
        let state = self.state.lock().await;
        state.pending.is_some() || self.engine.is_streaming().await
    }

    /// Ask the provider and reveal its answer in a new response.
    ///
    /// Returns once the answer is being revealed or the response has been
    /// finalized with a failure text. Provider failures are not errors.
    pub async fn submit(&self, prompt: &str) -> Result<Submission, ChatError> {
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        let (prompt_id, response_id, ticket) = {
            let mut state = self.state.lock().await;
            if state.pending.is_some() || self.engine.is_streaming().await {
                return Err(ChatError::Busy);
            }

            let (prompt_id, response_id) = {
                let mut conversation = self.conversation.lock().await;
                (
                    conversation.append_user(prompt),
                    conversation.append_pending_system(),
                )
            };
            self.events.publish(ChatEvent::Submitted {
                prompt_id,
                response_id,
                prompt: prompt.to_string(),
            });

            let ticket = self.begin_request(&mut state, response_id);
            (prompt_id, response_id, ticket)
        };

        tracing::debug!(%response_id, "prompt submitted");
        let outcome = self.resolve(ticket, response_id, prompt).await?;
        Ok(Submission {
            prompt_id,
            response_id,
            outcome,
        })
    }

    /// Ask again for the prompt that produced response `id` and reveal the
    /// new answer in place.
    pub async fn regenerate(&self, id: MessageId) -> Result<Outcome, ChatError> {
        let (prompt, ticket) = {
            let mut state = self.state.lock().await;
            if state.pending.is_some() || self.engine.is_streaming().await {
                return Err(ChatError::Busy);
            }

            let prompt = {
                let mut conversation = self.conversation.lock().await;
                if conversation.get(id).is_none() {
                    return Err(ConversationError::UnknownMessage(id).into());
                }
                let prompt = conversation
                    .prompt_for(id)
                    .map(str::to_string)
                    .ok_or(ChatError::NoPrompt(id))?;
                conversation.begin_regenerate(id)?;
                prompt
            };

            let ticket = self.begin_request(&mut state, id);
            (prompt, ticket)
        };

        tracing::debug!(%id, "regenerating response");
        self.resolve(ticket, id, &prompt).await
    }

    /// Stop whatever is in progress.
    ///
    /// A pending request is abandoned and its answer will be dropped when it
    /// arrives; a running reveal keeps the text shown so far. Returns false
    /// when nothing was in progress.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;

        if let Some(pending) = state.pending.take() {
            let id = pending.response_id;
            pending.loader.cancel().await;
            let cleared = self.conversation.lock().await.set_placeholder(id, "");
            if let Err(e) = cleared {
                tracing::warn!(%id, error = %e, "failed to clear placeholder");
            }
            tracing::debug!(%id, "pending request stopped");
            self.events.publish(ChatEvent::Stopped {
                id,
                content: String::new(),
            });
            return true;
        }

        match state.current {
            Some(id) => self.engine.stop_reveal(id).await,
            None => false,
        }
    }

    /// Toggle the upvote on a response.
    pub async fn upvote(&self, id: MessageId) -> Result<bool, ChatError> {
        Ok(self.conversation.lock().await.toggle_upvote(id)?)
    }

    /// Toggle the downvote on a response.
    pub async fn downvote(&self, id: MessageId) -> Result<bool, ChatError> {
        Ok(self.conversation.lock().await.toggle_downvote(id)?)
    }

    /// Share links for the content of message `id`.
    pub async fn share(&self, id: MessageId, page_url: &str) -> Result<Vec<ShareLink>, ChatError> {
        let conversation = self.conversation.lock().await;
        let message = conversation
            .get(id)
            .ok_or(ConversationError::UnknownMessage(id))?;
        Ok(share_links(&message.content, page_url))
    }

    /// Put the content of message `id` on the system clipboard.
    pub async fn copy(&self, id: MessageId) -> Result<(), ChatError> {
        let text = {
            let conversation = self.conversation.lock().await;
            conversation
                .get(id)
                .ok_or(ConversationError::UnknownMessage(id))?
                .content
                .clone()
        };
        copy_to_clipboard(&text)?;
        tracing::debug!(%id, chars = text.len(), "copied to clipboard");
        Ok(())
    }

    fn begin_request(&self, state: &mut SessionState, response_id: MessageId) -> u64 {
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        let loader = self.loader.start(self.conversation.clone(), response_id);
        state.pending = Some(Pending {
            ticket,
            response_id,
            loader,
        });
        state.current = Some(response_id);
        ticket
    }

    /// Wait for the provider and act on its answer, unless the request was
    /// stopped in the meantime.
    async fn resolve(
        &self,
        ticket: u64,
        response_id: MessageId,
        prompt: &str,
    ) -> Result<Outcome, ChatError> {
        let result =
            tokio::time::timeout(self.request_timeout, self.provider.complete(prompt)).await;

        let mut state = self.state.lock().await;
        let pending = match state.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                state.pending = other;
                tracing::debug!(%response_id, "discarding answer for a stopped request");
                return Ok(Outcome::Discarded);
            }
        };
        pending.loader.cancel().await;

        match result {
            Ok(Ok(text)) => {
                self.engine.start_reveal(response_id, &text).await?;
                Ok(Outcome::Revealing)
            }
            Ok(Err(e)) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "completion failed");
                self.finalize_failure(response_id, &e, PROVIDER_FALLBACK)
                    .await?;
                Ok(Outcome::Failed)
            }
            Err(_) => {
                let e = ProviderError::TimedOut(self.request_timeout);
                tracing::warn!(provider = self.provider.name(), error = %e, "completion timed out");
                self.finalize_failure(response_id, &e, TIMEOUT_MARKER).await?;
                Ok(Outcome::TimedOut)
            }
        }
    }

    async fn finalize_failure(
        &self,
        id: MessageId,
        error: &ProviderError,
        fallback: &str,
    ) -> Result<(), ChatError> {
        self.conversation.lock().await.mark_completed(id, fallback)?;
        self.events.publish(ChatEvent::Failed {
            id,
            reason: error.to_string(),
            fallback: fallback.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::EventBus;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Answers from a script, optionally after a delay.
    struct Scripted {
        answers: std::sync::Mutex<VecDeque<Result<String, ProviderError>>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(answers: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                answers: std::sync::Mutex::new(answers.into()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn ok(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("default answer".to_string()))
        }
    }

    fn session(provider: Arc<Scripted>, bus: &EventBus) -> ChatSession {
        ChatSession::new(provider, SessionConfig::default(), bus.sender())
    }

    async fn content(session: &ChatSession, id: MessageId) -> (String, bool) {
        let conv = session.conversation().lock().await;
        let msg = conv.get(id).unwrap();
        (msg.content.clone(), msg.completed)
    }

    // =========================================================================
    // Submit
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_reveal_timeline() {
        let bus = EventBus::new();
        let provider = Arc::new(Scripted::ok("hi there friend"));
        let session = session(provider.clone(), &bus);

        let submission = session.submit("hello").await.unwrap();
        assert_eq!(submission.outcome, Outcome::Revealing);
        let id = submission.response_id;

        sleep(ms(20)).await;
        assert_eq!(content(&session, id).await, (String::new(), false));
        sleep(ms(40)).await;
        assert_eq!(content(&session, id).await, ("hi there ".into(), false));
        sleep(ms(40)).await;
        assert_eq!(content(&session, id).await, ("hi there friend ".into(), false));
        sleep(ms(40)).await;
        assert_eq!(content(&session, id).await, ("hi there friend".into(), true));

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(!session.is_streaming().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_appends_prompt_and_response() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("ok")), &bus);

        let first = session.submit("one").await.unwrap();
        sleep(ms(500)).await;
        let second = session.submit("two").await.unwrap();
        sleep(ms(500)).await;

        let conv = session.conversation().lock().await;
        assert_eq!(conv.len(), 4);
        assert_eq!(conv.get(first.prompt_id).unwrap().content, "one");
        assert!(conv.get(second.prompt_id).unwrap().section_boundary);
        assert_eq!(conv.partition().len(), 2);
        assert_eq!(
            conv.active_section().unwrap().first_message_id(),
            Some(second.prompt_id)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_prompt_is_rejected() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("x")), &bus);

        assert!(matches!(session.submit("   ").await, Err(ChatError::EmptyPrompt)));
        assert!(session.conversation().lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_revealing_is_busy() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("a b c d e f")), &bus);

        session.submit("first").await.unwrap();
        assert!(session.is_streaming().await);
        assert!(matches!(session.submit("second").await, Err(ChatError::Busy)));

        sleep(ms(500)).await;
        assert!(!session.is_streaming().await);
        assert!(session.submit("third").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_waiting_is_busy() {
        let bus = EventBus::new();
        let provider = Arc::new(Scripted::ok("late").delayed(ms(1000)));
        let session = session(provider, &bus);

        let background = session.clone();
        let first = tokio::spawn(async move { background.submit("first").await });
        sleep(ms(100)).await;

        assert!(session.is_streaming().await);
        assert!(matches!(session.submit("second").await, Err(ChatError::Busy)));

        let submission = first.await.unwrap().unwrap();
        assert_eq!(submission.outcome, Outcome::Revealing);
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_provider_failure_finalizes_with_fallback() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let provider = Arc::new(Scripted::new(vec![Err(ProviderError::Status {
            status: 500,
            body: "boom".into(),
        })]));
        let session = session(provider, &bus);

        let submission = session.submit("hello").await.unwrap();
        assert_eq!(submission.outcome, Outcome::Failed);
        assert_eq!(
            content(&session, submission.response_id).await,
            (PROVIDER_FALLBACK.into(), true)
        );

        match rx.wait_terminal(submission.response_id).await.unwrap() {
            ChatEvent::Failed { fallback, reason, .. } => {
                assert_eq!(fallback, PROVIDER_FALLBACK);
                assert!(reason.contains("500"));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert!(!session.is_streaming().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_finalizes_with_marker() {
        let bus = EventBus::new();
        let provider = Arc::new(Scripted::ok("too late").delayed(Duration::from_secs(60)));
        let session = session(provider, &bus);

        let submission = session.submit("hello").await.unwrap();
        assert_eq!(submission.outcome, Outcome::TimedOut);
        assert_eq!(
            content(&session, submission.response_id).await,
            (TIMEOUT_MARKER.into(), true)
        );

        sleep(Duration::from_secs(60)).await;
        assert_eq!(
            content(&session, submission.response_id).await,
            (TIMEOUT_MARKER.into(), true)
        );
    }

    // =========================================================================
    // Stop
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_stop_while_waiting_discards_late_answer() {
        let bus = EventBus::new();
        let provider = Arc::new(Scripted::ok("late answer").delayed(ms(1000)));
        let session = session(provider, &bus);

        let background = session.clone();
        let task = tokio::spawn(async move { background.submit("hello").await });
        sleep(ms(400)).await;

        assert!(session.stop().await);
        let submission = task.await.unwrap().unwrap();
        assert_eq!(submission.outcome, Outcome::Discarded);

        sleep(ms(2000)).await;
        assert_eq!(
            content(&session, submission.response_id).await,
            (String::new(), false)
        );
        assert!(!session.is_streaming().await);

        // The stopped response is still open and can be asked again
        let outcome = session.regenerate(submission.response_id).await.unwrap();
        assert_eq!(outcome, Outcome::Revealing);
        sleep(ms(500)).await;
        assert_eq!(
            content(&session, submission.response_id).await,
            ("default answer".into(), true)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_reveal_keeps_partial_text() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("one two three four five")), &bus);

        let submission = session.submit("count").await.unwrap();
        sleep(ms(60)).await;
        assert!(session.stop().await);

        sleep(ms(500)).await;
        assert_eq!(
            content(&session, submission.response_id).await,
            ("one two ".into(), false)
        );
        assert!(!session.is_streaming().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("x")), &bus);
        assert!(!session.stop().await);
    }

    // =========================================================================
    // Regenerate and votes
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_replaces_answer() {
        let bus = EventBus::new();
        let provider = Arc::new(Scripted::new(vec![
            Ok("first answer".into()),
            Ok("second answer here".into()),
        ]));
        let session = session(provider.clone(), &bus);

        let submission = session.submit("question").await.unwrap();
        sleep(ms(500)).await;
        let id = submission.response_id;
        session.upvote(id).await.unwrap();

        assert_eq!(session.regenerate(id).await.unwrap(), Outcome::Revealing);
        sleep(ms(500)).await;

        let conv = session.conversation().lock().await;
        let msg = conv.get(id).unwrap();
        assert_eq!(msg.content, "second answer here");
        assert!(msg.completed);
        assert!(!msg.upvoted);
        assert_eq!(conv.len(), 2);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_rejects_prompts() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("answer")), &bus);

        let submission = session.submit("question").await.unwrap();
        sleep(ms(500)).await;

        assert!(matches!(
            session.regenerate(submission.prompt_id).await,
            Err(ChatError::NoPrompt(_))
        ));
        assert!(matches!(
            session.regenerate(MessageId::new()).await,
            Err(ChatError::Conversation(ConversationError::UnknownMessage(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_votes_toggle() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("answer")), &bus);
        let submission = session.submit("question").await.unwrap();
        let id = submission.response_id;

        assert!(session.upvote(id).await.unwrap());
        assert!(session.downvote(id).await.unwrap());
        let conv = session.conversation().lock().await;
        assert!(!conv.get(id).unwrap().upvoted);
        assert!(conv.get(id).unwrap().downvoted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_share_uses_message_content() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("shared text")), &bus);
        let submission = session.submit("question").await.unwrap();
        sleep(ms(500)).await;

        let links = session
            .share(submission.response_id, "http://localhost")
            .await
            .unwrap();
        assert!(links[0].url.contains("shared%20text"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_unknown_message_fails_before_clipboard() {
        let bus = EventBus::new();
        let session = session(Arc::new(Scripted::ok("x")), &bus);

        assert!(matches!(
            session.copy(MessageId::new()).await,
            Err(ChatError::Conversation(ConversationError::UnknownMessage(_)))
        ));
    }
}
