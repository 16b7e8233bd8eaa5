//! codexchat - chat with hosted LLMs through a small relay server
//!
//! `serve` runs the relay backend, `chat` opens the interactive client and
//! `ask` sends a single prompt.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use codexchat::cli;
use codexchat::config::{load_env_file, Settings, DEFAULT_ENV_FILE};
use codexchat::provider::{RelayRoute, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL};
use codexchat::server::Server;

/// Chat with Gemini or OpenAI through a relay server
#[derive(Parser, Debug)]
#[command(name = "codexchat")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the relay server
    Serve(ServeArgs),
    /// Interactive chat (default)
    Chat(ClientArgs),
    /// Send a single prompt and exit
    Ask {
        /// The prompt to send
        prompt: String,
        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Gemini API key (GEMNI_API_KEY is also read)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Gemini model
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// OpenAI model
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_OPENAI_MODEL)]
    openai_model: String,

    /// Maximum tokens per OpenAI answer
    #[arg(long, default_value_t = 100)]
    max_tokens: u32,
}

#[derive(clap::Args, Debug, Clone)]
struct ClientArgs {
    /// Relay server URL
    #[arg(long, env = "CODEXCHAT_BACKEND_URL", default_value = "http://localhost:5000")]
    backend_url: String,

    /// Relay route to use
    #[arg(long, value_enum, default_value_t = RelayRoute::Gemini)]
    route: RelayRoute,

    /// Seconds to wait for a response
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Words revealed per tick
    #[arg(long, default_value_t = 2)]
    chunk_size: usize,

    /// Milliseconds between reveal ticks
    #[arg(long, default_value_t = 40)]
    word_delay_ms: u64,
}

impl Default for ClientArgs {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            backend_url: std::env::var("CODEXCHAT_BACKEND_URL")
                .unwrap_or(defaults.backend_url),
            route: defaults.route,
            timeout_secs: defaults.request_timeout.as_secs(),
            chunk_size: defaults.chunk_size,
            word_delay_ms: defaults.word_delay.as_millis() as u64,
        }
    }
}

impl ClientArgs {
    fn settings(&self) -> Settings {
        Settings {
            backend_url: self.backend_url.clone(),
            route: self.route,
            request_timeout: Duration::from_secs(self.timeout_secs),
            chunk_size: self.chunk_size,
            word_delay: Duration::from_millis(self.word_delay_ms),
            ..Settings::default()
        }
    }
}

impl ServeArgs {
    fn settings(&self) -> Settings {
        Settings {
            port: self.port,
            gemini_api_key: self.gemini_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
            gemini_model: self.gemini_model.clone(),
            openai_model: self.openai_model.clone(),
            openai_max_tokens: self.max_tokens,
            ..Settings::default()
        }
        .with_legacy_gemini_key()
    }
}

fn main() -> anyhow::Result<()> {
    // Load the env file first so clap sees its variables
    let env_file = std::env::var("CODEXCHAT_ENV_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENV_FILE));
    let env_loaded = load_env_file(&env_file);

    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        // Determine log level from args or env
        let default_filter = if args.verbose {
            "trace"
        } else if args.debug {
            "debug"
        } else {
            "warn" // Quiet by default for normal use
        };

        // Initialize tracing with stderr output
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();

        if args.debug || args.verbose {
            tracing::info!("Debug logging enabled");
        }
        match env_loaded {
            Ok(true) => tracing::debug!(path = %env_file.display(), "env file loaded"),
            Ok(false) => {}
            Err(e) => tracing::warn!("{}", e),
        }

        match args.command {
            Some(Commands::Serve(serve)) => {
                let settings = serve.settings();
                let addr = settings.listen_addr();
                Server::from_clients(settings.gemini_client(), settings.openai_client())
                    .run(&addr)
                    .await?;
            }
            Some(Commands::Ask { prompt, client }) => {
                let settings = client.settings();
                settings.validate()?;
                cli::run_single_prompt(&settings, &prompt).await?;
            }
            Some(Commands::Chat(client)) => {
                let settings = client.settings();
                settings.validate()?;
                cli::run_interactive(&settings).await?;
            }
            None => {
                let settings = ClientArgs::default().settings();
                settings.validate()?;
                cli::run_interactive(&settings).await?;
            }
        }

        Ok(())
    })
}
