//! Terminal renderer for chat events.

use super::{ChatEvent, NoticeLevel};
use crossterm::{
    cursor::MoveToColumn,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
    ExecutableCommand,
};
use std::io::{stdout, Write};

/// Render style configuration.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub info_color: Color,
    pub success_color: Color,
    pub warning_color: Color,
    pub error_color: Color,
    pub bot_color: Color,
    pub placeholder_color: Color,
    /// Printed before every response line.
    pub bot_prefix: &'static str,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            info_color: Color::White,
            success_color: Color::Green,
            warning_color: Color::Yellow,
            error_color: Color::Red,
            bot_color: Color::Cyan,
            placeholder_color: Color::DarkGrey,
            bot_prefix: "🤖 ",
        }
    }
}

/// Terminal renderer for chat events.
///
/// Responses are drawn on a single growing line: loader frames overwrite
/// the line, revealed chunks are appended to it.
pub struct TerminalRenderer {
    style: RenderStyle,
    line_open: bool,
}

impl TerminalRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self::with_style(RenderStyle::default())
    }

    /// Create with custom style.
    pub fn with_style(style: RenderStyle) -> Self {
        Self {
            style,
            line_open: false,
        }
    }

    /// Render an event to the terminal.
    pub fn render(&mut self, event: &ChatEvent) -> std::io::Result<()> {
        match event {
            ChatEvent::Submitted { .. } => self.render_placeholder(""),
            ChatEvent::Placeholder { text, .. } => self.render_placeholder(text),
            ChatEvent::RevealStarted { .. } => self.restart_line(),
            ChatEvent::Chunk { text, .. } => self.render_chunk(text),
            ChatEvent::Completed { .. } => self.close_line(),
            ChatEvent::Stopped { .. } => self.render_stopped(),
            ChatEvent::Failed { fallback, .. } => self.render_failed(fallback),
            ChatEvent::Notice(notice) => self.render_notice(notice.level, &notice.text),
        }
    }

    fn restart_line(&mut self) -> std::io::Result<()> {
        let mut stdout = stdout();
        stdout
            .execute(MoveToColumn(0))?
            .execute(Clear(ClearType::CurrentLine))?
            .execute(SetForegroundColor(self.style.bot_color))?
            .execute(Print(self.style.bot_prefix))?
            .execute(ResetColor)?;
        stdout.flush()?;
        self.line_open = true;
        Ok(())
    }

    fn render_placeholder(&mut self, text: &str) -> std::io::Result<()> {
        self.restart_line()?;
        let mut stdout = stdout();
        stdout
            .execute(SetForegroundColor(self.style.placeholder_color))?
            .execute(Print(text))?
            .execute(ResetColor)?;
        stdout.flush()
    }

    fn render_chunk(&mut self, text: &str) -> std::io::Result<()> {
        if !self.line_open {
            self.restart_line()?;
        }
        let mut stdout = stdout();
        stdout.execute(Print(text))?;
        stdout.flush()
    }

    fn close_line(&mut self) -> std::io::Result<()> {
        if self.line_open {
            stdout().execute(Print("\n"))?;
            self.line_open = false;
        }
        Ok(())
    }

    fn render_stopped(&mut self) -> std::io::Result<()> {
        stdout()
            .execute(SetAttribute(Attribute::Dim))?
            .execute(Print(" [stopped]"))?
            .execute(SetAttribute(Attribute::Reset))?;
        self.line_open = true;
        self.close_line()
    }

    fn render_failed(&mut self, fallback: &str) -> std::io::Result<()> {
        self.restart_line()?;
        stdout()
            .execute(SetForegroundColor(self.style.warning_color))?
            .execute(Print(fallback))?
            .execute(ResetColor)?;
        self.close_line()
    }

    fn render_notice(&mut self, level: NoticeLevel, text: &str) -> std::io::Result<()> {
        self.close_line()?;

        let color = match level {
            NoticeLevel::Info => self.style.info_color,
            NoticeLevel::Success => self.style.success_color,
            NoticeLevel::Warning => self.style.warning_color,
            NoticeLevel::Error => self.style.error_color,
        };

        let prefix = match level {
            NoticeLevel::Success => "✓ ",
            NoticeLevel::Warning => "⚠ ",
            NoticeLevel::Error => "✗ ",
            NoticeLevel::Info => "",
        };

        stdout()
            .execute(SetForegroundColor(color))?
            .execute(Print(prefix))?
            .execute(Print(text))?
            .execute(Print("\n"))?
            .execute(ResetColor)?;

        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}
