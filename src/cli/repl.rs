//! Interactive chat loop.

use std::sync::Arc;

use reedline::Signal;
use tokio::task::JoinHandle;

use super::commands::{help_text, parse_command, Command};
use super::prompt::{create_reedline, ChatPrompt};
use crate::chat::{format_share_links, ChatError, ChatSession};
use crate::config::Settings;
use crate::conversation::MessageId;
use crate::messaging::{BusError, ChatEvent, EventBus, EventReceiver, TerminalRenderer};
use crate::provider::{CompletionProvider, RelayRoute};

/// Page URL used for share links when none is given.
const DEFAULT_SHARE_URL: &str = "http://localhost:5173/";

/// Result of handling a line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineResult {
    Continue,
    Exit,
}

/// REPL state.
pub struct Repl {
    session: ChatSession,
    bus: EventBus,
    renderer: TerminalRenderer,
    route: RelayRoute,
}

impl Repl {
    /// REPL talking to the relay backend from `settings`.
    pub fn new(settings: &Settings) -> Self {
        let relay = settings.relay_client();
        let route = relay.route();
        Self::with_provider(Arc::new(relay), route, settings)
    }

    pub fn with_provider(
        provider: Arc<dyn CompletionProvider>,
        route: RelayRoute,
        settings: &Settings,
    ) -> Self {
        let bus = EventBus::new();
        let session = ChatSession::new(provider, settings.session_config(), bus.sender());
        Self {
            session,
            bus,
            renderer: TerminalRenderer::new(),
            route,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Run the REPL loop until `/exit` or Ctrl-D.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut line_editor = create_reedline();
        let prompt = ChatPrompt::new(self.route);

        loop {
            match line_editor.read_line(&prompt) {
                Ok(Signal::Success(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if self.handle_line(line).await? == LineResult::Exit {
                        break;
                    }
                }
                Ok(Signal::CtrlC) => {
                    println!("^C");
                    continue;
                }
                Ok(Signal::CtrlD) => break,
                Err(e) => {
                    tracing::error!(error = %e, "line editor failed");
                    break;
                }
            }
        }

        println!("Bye!");
        Ok(())
    }

    /// Handle one line of input: a slash command or a prompt.
    pub async fn handle_line(&mut self, line: &str) -> anyhow::Result<LineResult> {
        let Some(command) = parse_command(line) else {
            self.ask(line).await?;
            return Ok(LineResult::Continue);
        };

        match command {
            Command::Help => println!("{}", help_text()),
            Command::Exit => return Ok(LineResult::Exit),
            Command::Clear => {
                if self.session.is_streaming().await {
                    self.notice(ChatEvent::warning("Wait for the response to finish first"))?;
                } else {
                    self.session.conversation().lock().await.clear();
                    self.notice(ChatEvent::success("Conversation cleared"))?;
                }
            }
            Command::Regenerate => match self.last_response().await {
                Some(id) => self.regenerate(id).await?,
                None => self.notice(ChatEvent::warning("Nothing to regenerate"))?,
            },
            Command::Upvote => self.vote(true).await?,
            Command::Downvote => self.vote(false).await?,
            Command::Copy => match self.last_response().await {
                Some(id) => match self.session.copy(id).await {
                    Ok(()) => self.notice(ChatEvent::success("Copied to clipboard"))?,
                    Err(e) => self.notice(ChatEvent::error(e.to_string()))?,
                },
                None => self.notice(ChatEvent::warning("Nothing to copy"))?,
            },
            Command::Share(url) => match self.last_response().await {
                Some(id) => {
                    let links = self
                        .session
                        .share(id, url.as_deref().unwrap_or(DEFAULT_SHARE_URL))
                        .await?;
                    println!("{}", format_share_links(&links));
                }
                None => self.notice(ChatEvent::warning("Nothing to share"))?,
            },
            Command::Sections => self.print_sections().await?,
            Command::Unknown(cmd) => {
                self.notice(ChatEvent::warning(format!("Unknown command: /{}", cmd)))?;
            }
        }
        Ok(LineResult::Continue)
    }

    /// Submit a prompt and render the response until it finishes.
    pub async fn ask(&mut self, prompt: &str) -> anyhow::Result<()> {
        let rx = self.bus.subscribe();
        let session = self.session.clone();
        let prompt = prompt.to_string();
        let task = tokio::spawn(async move { session.submit(&prompt).await });
        self.follow(task, None, rx).await
    }

    async fn regenerate(&mut self, id: MessageId) -> anyhow::Result<()> {
        let rx = self.bus.subscribe();
        let session = self.session.clone();
        let task = tokio::spawn(async move { session.regenerate(id).await });
        self.follow(task, Some(id), rx).await
    }

    /// Render events for one response until it reaches a terminal event.
    ///
    /// Ctrl-C stops the response. A stopped request keeps running in the
    /// background and its answer is dropped.
    async fn follow<T: Send + 'static>(
        &mut self,
        mut task: JoinHandle<Result<T, ChatError>>,
        mut response_id: Option<MessageId>,
        mut rx: EventReceiver,
    ) -> anyhow::Result<()> {
        let mut task_done = false;

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Ok(event) => {
                        if let ChatEvent::Submitted { response_id: id, .. } = &event {
                            response_id = Some(*id);
                        }
                        self.renderer.render(&event)?;
                        if event.is_terminal() && response_id.is_some() && event.message_id() == response_id {
                            break;
                        }
                    }
                    Err(BusError::Lagged(n)) => {
                        tracing::debug!(skipped = n, "repl lagged behind the event bus");
                    }
                    Err(BusError::Closed) => break,
                },
                joined = &mut task, if !task_done => {
                    task_done = true;
                    if let Err(e) = joined? {
                        self.notice(ChatEvent::error(e.to_string()))?;
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    if !self.session.stop().await {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    async fn vote(&mut self, up: bool) -> anyhow::Result<()> {
        let Some(id) = self.last_response().await else {
            return self.notice(ChatEvent::warning("Nothing to vote on"));
        };
        let (active, label) = if up {
            (self.session.upvote(id).await?, "Upvoted")
        } else {
            (self.session.downvote(id).await?, "Downvoted")
        };
        let text = if active {
            label.to_string()
        } else {
            "Vote cleared".to_string()
        };
        self.notice(ChatEvent::success(text))
    }

    /// The most recent response in the conversation.
    async fn last_response(&self) -> Option<MessageId> {
        self.session
            .conversation()
            .lock()
            .await
            .messages()
            .iter()
            .rev()
            .find(|m| m.is_system())
            .map(|m| m.id)
    }

    async fn print_sections(&mut self) -> anyhow::Result<()> {
        let lines = {
            let conversation = self.session.conversation().lock().await;
            let lines: Vec<String> = conversation
                .partition()
                .iter()
                .map(|section| {
                    let marker = if section.is_active { "*" } else { " " };
                    let opener = section
                        .messages
                        .first()
                        .map(|m| m.content.as_str())
                        .unwrap_or("");
                    format!(
                        "{} {:>3}  {} message(s)  {}",
                        marker,
                        section.index,
                        section.len(),
                        opener
                    )
                })
                .collect();
            lines
        };
        if lines.is_empty() {
            return self.notice(ChatEvent::info("No messages yet."));
        }
        for line in lines {
            println!("{}", line);
        }
        Ok(())
    }

    fn notice(&mut self, event: ChatEvent) -> anyhow::Result<()> {
        self.renderer.render(&event)?;
        Ok(())
    }
}
