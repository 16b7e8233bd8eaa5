//! CLI runner for interactive and single-prompt modes.

use super::repl::Repl;
use crate::config::Settings;

/// Run a single prompt and exit.
pub async fn run_single_prompt(settings: &Settings, prompt: &str) -> anyhow::Result<()> {
    let mut repl = Repl::new(settings);
    repl.ask(prompt).await?;
    Ok(())
}

/// Run in interactive mode.
pub async fn run_interactive(settings: &Settings) -> anyhow::Result<()> {
    print_banner(settings);

    let mut repl = Repl::new(settings);
    repl.run().await?;

    Ok(())
}

/// Print the welcome banner.
pub fn print_banner(settings: &Settings) {
    println!();
    println!(
        "  \x1b[1;33mcodexchat\x1b[0m  \x1b[2mv{}\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "  \x1b[2mRelaying through {} ({})\x1b[0m",
        settings.backend_url, settings.route
    );
    println!("  \x1b[2mType \x1b[0m\x1b[1;36m/help\x1b[0m\x1b[2m for commands, or start chatting!\x1b[0m");
    println!();
}
