//! Slash commands understood by the REPL.

/// Available commands with descriptions.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/exit", "Leave the chat"),
    ("/clear", "Forget the conversation"),
    ("/regen", "Ask again for the last response"),
    ("/up", "Toggle an upvote on the last response"),
    ("/down", "Toggle a downvote on the last response"),
    ("/copy", "Copy the last response to the clipboard"),
    ("/share", "Print share links for the last response"),
    ("/sections", "List conversation sections"),
];

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Clear,
    Regenerate,
    Upvote,
    Downvote,
    Copy,
    /// Share links, optionally for a specific page URL
    Share(Option<String>),
    Sections,
    Unknown(String),
}

/// Parse a line starting with `/`. Returns `None` for ordinary prompts.
pub fn parse_command(input: &str) -> Option<Command> {
    let rest = input.trim().strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("").to_lowercase();
    let args = parts.next().map(str::trim).filter(|a| !a.is_empty());

    Some(match cmd.as_str() {
        "help" | "h" | "?" => Command::Help,
        "exit" | "quit" | "q" => Command::Exit,
        "clear" | "new" => Command::Clear,
        "regen" | "regenerate" | "r" => Command::Regenerate,
        "up" | "upvote" => Command::Upvote,
        "down" | "downvote" => Command::Downvote,
        "copy" | "cp" => Command::Copy,
        "share" => Command::Share(args.map(str::to_string)),
        "sections" => Command::Sections,
        _ => Command::Unknown(cmd),
    })
}

/// Help text listing every command.
pub fn help_text() -> String {
    let mut out = String::from("Commands:\n");
    for (cmd, desc) in COMMANDS {
        out.push_str(&format!("  {:<10} {}\n", cmd, desc));
    }
    out.push_str("\nAnything else is sent as a prompt. Ctrl-C stops a response.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(parse_command("/q"), Some(Command::Exit));
        assert_eq!(parse_command("/QUIT"), Some(Command::Exit));
        assert_eq!(parse_command("/?"), Some(Command::Help));
        assert_eq!(parse_command("/r"), Some(Command::Regenerate));
        assert_eq!(parse_command("/new"), Some(Command::Clear));
        assert_eq!(parse_command("  /up  "), Some(Command::Upvote));
        assert_eq!(parse_command("/downvote"), Some(Command::Downvote));
        assert_eq!(parse_command("/sections"), Some(Command::Sections));
    }

    #[test]
    fn test_copy_command() {
        assert_eq!(parse_command("/copy"), Some(Command::Copy));
        assert_eq!(parse_command("/cp"), Some(Command::Copy));
        assert_eq!(parse_command("/COPY"), Some(Command::Copy));
    }

    #[test]
    fn test_share_argument() {
        assert_eq!(parse_command("/share"), Some(Command::Share(None)));
        assert_eq!(
            parse_command("/share https://example.com/chat"),
            Some(Command::Share(Some("https://example.com/chat".into())))
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse_command("/nope"), Some(Command::Unknown("nope".into())));
        assert_eq!(parse_command("/"), Some(Command::Unknown(String::new())));
    }

    #[test]
    fn test_help_lists_all_commands() {
        let help = help_text();
        for (cmd, _) in COMMANDS {
            assert!(help.contains(cmd), "missing {}", cmd);
        }
    }
}
