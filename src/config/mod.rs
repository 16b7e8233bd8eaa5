//! Configuration management.

mod env_file;
mod settings;

pub use env_file::{load_env_file, DEFAULT_ENV_FILE};
pub use settings::{legacy_gemini_key, ConfigError, Settings};
