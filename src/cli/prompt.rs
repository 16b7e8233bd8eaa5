//! Reedline prompt and highlighter.

use nu_ansi_term::{Color, Style};
use reedline::{
    Highlighter, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, Reedline,
    StyledText,
};
use std::borrow::Cow;

use super::commands::COMMANDS;
use crate::provider::RelayRoute;

/// Prompt showing the relay route in use.
pub struct ChatPrompt {
    pub route: RelayRoute,
}

impl ChatPrompt {
    pub fn new(route: RelayRoute) -> Self {
        Self { route }
    }
}

impl Prompt for ChatPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("\x1b[1;33mcodex\x1b[0m \x1b[2m[{}]\x1b[0m", self.route))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" > ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, hs: PromptHistorySearch) -> Cow<'_, str> {
        let prefix = match hs.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}search: {}) ", prefix, hs.term))
    }
}

/// Highlights known slash commands in cyan, unknown ones in yellow.
#[derive(Clone)]
pub struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        if line.starts_with('/') {
            let cmd_end = line.find(' ').unwrap_or(line.len());
            let cmd = &line[..cmd_end];
            let style = if COMMANDS.iter().any(|(c, _)| *c == cmd) {
                Style::new().fg(Color::Cyan).bold()
            } else {
                Style::new().fg(Color::Yellow)
            };
            styled.push((style, cmd.to_string()));

            if cmd_end < line.len() {
                styled.push((Style::default(), line[cmd_end..].to_string()));
            }
        } else {
            styled.push((Style::default(), line.to_string()));
        }

        styled
    }
}

/// Line editor with command highlighting.
pub fn create_reedline() -> Reedline {
    Reedline::create().with_highlighter(Box::new(CommandHighlighter))
}
