//! Resolved runtime settings.

use std::time::Duration;

use thiserror::Error;

use crate::chat::{SessionConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::provider::{
    GeminiClient, OpenAiClient, OpenAiOptions, RelayClient, RelayRoute, DEFAULT_GEMINI_MODEL,
    DEFAULT_OPENAI_MODEL,
};
use crate::reveal::{LoaderConfig, RevealConfig, DEFAULT_CHUNK_SIZE, DEFAULT_WORD_DELAY};

/// Misspelled Gemini key variable still honored for existing env files.
const LEGACY_GEMINI_KEY_VAR: &str = "GEMNI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load env file {path}: {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
    #[error("Backend URL must start with http:// or https://: {0}")]
    InvalidBackendUrl(String),
    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,
    #[error("Request timeout must be greater than zero")]
    InvalidTimeout,
}

/// Settings for the server and the chat front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    /// Relay server the chat client talks to
    pub backend_url: String,
    pub route: RelayRoute,
    pub request_timeout: Duration,
    pub chunk_size: usize,
    pub word_delay: Duration,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_model: String,
    pub openai_max_tokens: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 5000,
            backend_url: "http://localhost:5000".to_string(),
            route: RelayRoute::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            word_delay: DEFAULT_WORD_DELAY,
            gemini_api_key: None,
            openai_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_max_tokens: OpenAiOptions::default().max_tokens,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBackendUrl(self.backend_url.clone()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Address the relay server binds to.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reveal: RevealConfig {
                chunk_size: self.chunk_size,
                word_delay: self.word_delay,
            },
            loader: LoaderConfig::default(),
            request_timeout: self.request_timeout,
        }
    }

    pub fn relay_client(&self) -> RelayClient {
        RelayClient::new(self.backend_url.clone(), self.route)
    }

    pub fn gemini_client(&self) -> GeminiClient {
        GeminiClient::new(self.gemini_api_key.clone()).with_model(self.gemini_model.clone())
    }

    pub fn openai_client(&self) -> OpenAiClient {
        OpenAiClient::new(self.openai_api_key.clone()).with_options(OpenAiOptions {
            model: self.openai_model.clone(),
            max_tokens: self.openai_max_tokens,
            ..OpenAiOptions::default()
        })
    }

    /// Fill a missing Gemini key from the legacy variable.
    pub fn with_legacy_gemini_key(mut self) -> Self {
        if self.gemini_api_key.as_deref().map_or(true, str::is_empty) {
            self.gemini_api_key = legacy_gemini_key();
        }
        self
    }
}

/// Value of the legacy Gemini key variable, if set and non-empty.
pub fn legacy_gemini_key() -> Option<String> {
    std::env::var(LEGACY_GEMINI_KEY_VAR)
        .ok()
        .filter(|k| !k.is_empty())
}
